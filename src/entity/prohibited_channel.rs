use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prohibited_channels")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub guild_id: i64,
  #[sea_orm(primary_key, auto_increment = false)]
  pub channel_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

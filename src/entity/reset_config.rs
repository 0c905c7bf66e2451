//! Weekly reset schedule for a guild, in the fixed local time zone
//! (weekday 0 = Monday)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_reset_config")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub guild_id: i64,
  pub weekday: i32,
  pub hour: i32,
  pub minute: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

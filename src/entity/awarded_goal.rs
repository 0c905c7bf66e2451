//! Record of a user having completed a goal

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::goal;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "awarded_goals")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  #[sea_orm(primary_key, auto_increment = false)]
  pub guild_id: i64,
  #[sea_orm(primary_key, auto_increment = false)]
  pub goal_id: i32,
  pub awarded_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "goal::Entity",
    from = "Column::GoalId",
    to = "goal::Column::Id"
  )]
  Goal,
}

impl Related<goal::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Goal.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

//! Time goal for a guild: a second threshold, an optional reward role and
//! optional prerequisite roles

use std::collections::HashSet;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub guild_id: i64,
  pub name: String,
  pub seconds_required: i64,
  pub reward_role_id: Option<i64>,
  /// Comma-separated role ids; holding any one of them qualifies.
  pub required_role_ids: Option<String>,
  pub reset_on_weekly: bool,
}

impl Model {
  pub fn required_roles(&self) -> HashSet<i64> {
    self
      .required_role_ids
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .filter_map(|id| id.trim().parse().ok())
      .collect()
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

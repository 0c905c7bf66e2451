//! Database migrations using SeaORM

use sea_orm_migration::prelude::*;

mod m20260829_000001_create_sessions;
mod m20260829_000002_create_total_times;
mod m20260829_000003_create_goals;
mod m20260829_000004_create_reset_tables;
mod m20260829_000005_create_weekly_history;
mod m20260829_000006_create_channel_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260829_000001_create_sessions::Migration),
      Box::new(m20260829_000002_create_total_times::Migration),
      Box::new(m20260829_000003_create_goals::Migration),
      Box::new(m20260829_000004_create_reset_tables::Migration),
      Box::new(m20260829_000005_create_weekly_history::Migration),
      Box::new(m20260829_000006_create_channel_tables::Migration),
    ]
  }
}

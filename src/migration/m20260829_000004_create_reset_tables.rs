use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(WeeklyResetConfig::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(WeeklyResetConfig::GuildId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(WeeklyResetConfig::Weekday).integer().not_null())
          .col(ColumnDef::new(WeeklyResetConfig::Hour).integer().not_null())
          .col(ColumnDef::new(WeeklyResetConfig::Minute).integer().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(ResetState::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ResetState::GuildId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(ResetState::LastReset).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ResetState::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(WeeklyResetConfig::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum WeeklyResetConfig {
  Table,
  GuildId,
  Weekday,
  Hour,
  Minute,
}

#[derive(DeriveIden)]
pub enum ResetState {
  Table,
  GuildId,
  LastReset,
}

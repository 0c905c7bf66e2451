use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(WeeklyHistory::Table)
          .if_not_exists()
          .col(ColumnDef::new(WeeklyHistory::GuildId).big_integer().not_null())
          .col(ColumnDef::new(WeeklyHistory::UserId).big_integer().not_null())
          .col(
            ColumnDef::new(WeeklyHistory::ArchiveDate).date_time().not_null(),
          )
          .col(
            ColumnDef::new(WeeklyHistory::TotalSeconds)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(WeeklyHistory::Pinned)
              .boolean()
              .not_null()
              .default(false),
          )
          .primary_key(
            Index::create()
              .col(WeeklyHistory::GuildId)
              .col(WeeklyHistory::UserId)
              .col(WeeklyHistory::ArchiveDate),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_weekly_history_guild_date")
          .table(WeeklyHistory::Table)
          .col(WeeklyHistory::GuildId)
          .col(WeeklyHistory::ArchiveDate)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(HistoryConfig::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(HistoryConfig::GuildId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(HistoryConfig::PostChannelId).big_integer().null(),
          )
          .col(
            ColumnDef::new(HistoryConfig::RetentionDays)
              .integer()
              .not_null()
              .default(90),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(HistoryConfig::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(WeeklyHistory::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum WeeklyHistory {
  Table,
  GuildId,
  UserId,
  ArchiveDate,
  TotalSeconds,
  Pinned,
}

#[derive(DeriveIden)]
pub enum HistoryConfig {
  Table,
  GuildId,
  PostChannelId,
  RetentionDays,
}

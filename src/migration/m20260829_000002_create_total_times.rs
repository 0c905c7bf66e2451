use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(TotalTimes::Table)
          .if_not_exists()
          .col(ColumnDef::new(TotalTimes::UserId).big_integer().not_null())
          .col(ColumnDef::new(TotalTimes::GuildId).big_integer().not_null())
          .col(
            ColumnDef::new(TotalTimes::TotalSeconds)
              .big_integer()
              .not_null()
              .default(0),
          )
          .primary_key(
            Index::create().col(TotalTimes::UserId).col(TotalTimes::GuildId),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_total_times_guild")
          .table(TotalTimes::Table)
          .col(TotalTimes::GuildId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(TotalTimes::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum TotalTimes {
  Table,
  UserId,
  GuildId,
  TotalSeconds,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Sessions::Table)
          .if_not_exists()
          .col(ColumnDef::new(Sessions::UserId).big_integer().not_null())
          .col(ColumnDef::new(Sessions::GuildId).big_integer().not_null())
          .col(ColumnDef::new(Sessions::ChannelId).big_integer().not_null())
          .col(ColumnDef::new(Sessions::StartTime).date_time().not_null())
          .primary_key(
            Index::create().col(Sessions::UserId).col(Sessions::GuildId),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_sessions_guild")
          .table(Sessions::Table)
          .col(Sessions::GuildId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Sessions::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Sessions {
  Table,
  UserId,
  GuildId,
  ChannelId,
  StartTime,
}

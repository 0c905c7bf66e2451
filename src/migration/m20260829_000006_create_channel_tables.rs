use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(LogChannels::Table)
          .if_not_exists()
          .col(ColumnDef::new(LogChannels::GuildId).big_integer().not_null())
          .col(ColumnDef::new(LogChannels::ChannelType).string().not_null())
          .col(ColumnDef::new(LogChannels::ChannelId).big_integer().not_null())
          .primary_key(
            Index::create()
              .col(LogChannels::GuildId)
              .col(LogChannels::ChannelType),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(ProhibitedChannels::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ProhibitedChannels::GuildId)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(ProhibitedChannels::ChannelId)
              .big_integer()
              .not_null(),
          )
          .primary_key(
            Index::create()
              .col(ProhibitedChannels::GuildId)
              .col(ProhibitedChannels::ChannelId),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ProhibitedChannels::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(LogChannels::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum LogChannels {
  Table,
  GuildId,
  ChannelType,
  ChannelId,
}

#[derive(DeriveIden)]
pub enum ProhibitedChannels {
  Table,
  GuildId,
  ChannelId,
}

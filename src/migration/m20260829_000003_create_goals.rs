use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Goals::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Goals::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Goals::GuildId).big_integer().not_null())
          .col(ColumnDef::new(Goals::Name).string().not_null())
          .col(ColumnDef::new(Goals::SecondsRequired).big_integer().not_null())
          .col(ColumnDef::new(Goals::RewardRoleId).big_integer().null())
          .col(ColumnDef::new(Goals::RequiredRoleIds).string().null())
          .col(
            ColumnDef::new(Goals::ResetOnWeekly)
              .boolean()
              .not_null()
              .default(true),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_goals_guild")
          .table(Goals::Table)
          .col(Goals::GuildId)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(AwardedGoals::Table)
          .if_not_exists()
          .col(ColumnDef::new(AwardedGoals::UserId).big_integer().not_null())
          .col(ColumnDef::new(AwardedGoals::GuildId).big_integer().not_null())
          .col(ColumnDef::new(AwardedGoals::GoalId).integer().not_null())
          .col(ColumnDef::new(AwardedGoals::AwardedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(AwardedGoals::UserId)
              .col(AwardedGoals::GuildId)
              .col(AwardedGoals::GoalId),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_awarded_goals_goal")
          .table(AwardedGoals::Table)
          .col(AwardedGoals::GuildId)
          .col(AwardedGoals::GoalId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(AwardedGoals::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Goals::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Goals {
  Table,
  Id,
  GuildId,
  Name,
  SecondsRequired,
  RewardRoleId,
  RequiredRoleIds,
  ResetOnWeekly,
}

#[derive(DeriveIden)]
pub enum AwardedGoals {
  Table,
  UserId,
  GuildId,
  GoalId,
  AwardedAt,
}

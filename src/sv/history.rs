use crate::{
  entity::{history_config, total_time, weekly_history},
  prelude::*,
};

pub const DEFAULT_RETENTION_DAYS: i32 = 90;

pub struct History<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> History<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Snapshot every nonzero accumulated total of the guild, dated `now`.
  /// Returns the number of archived entries.
  pub async fn archive(&self, guild_id: i64, now: DateTime) -> Result<usize> {
    let rows = total_time::Entity::find()
      .filter(total_time::Column::GuildId.eq(guild_id))
      .filter(total_time::Column::TotalSeconds.gt(0))
      .all(self.db)
      .await?;

    let txn = self.db.begin().await?;
    for row in &rows {
      weekly_history::ActiveModel {
        guild_id: Set(guild_id),
        user_id: Set(row.user_id),
        archive_date: Set(now),
        total_seconds: Set(row.total_seconds),
        pinned: Set(false),
      }
      .insert(&txn)
      .await?;
    }
    txn.commit().await?;

    Ok(rows.len())
  }

  /// Distinct archive dates, newest first.
  pub async fn dates(&self, guild_id: i64) -> Result<Vec<DateTime>> {
    let dates: Vec<DateTime> = weekly_history::Entity::find()
      .filter(weekly_history::Column::GuildId.eq(guild_id))
      .select_only()
      .column(weekly_history::Column::ArchiveDate)
      .distinct()
      .order_by_desc(weekly_history::Column::ArchiveDate)
      .into_tuple()
      .all(self.db)
      .await?;
    Ok(dates)
  }

  /// Standings of one archived week, best first.
  pub async fn by_date(
    &self,
    guild_id: i64,
    date: DateTime,
  ) -> Result<Vec<weekly_history::Model>> {
    let rows = weekly_history::Entity::find()
      .filter(weekly_history::Column::GuildId.eq(guild_id))
      .filter(weekly_history::Column::ArchiveDate.eq(date))
      .order_by_desc(weekly_history::Column::TotalSeconds)
      .all(self.db)
      .await?;
    Ok(rows)
  }

  /// Pin or unpin a whole archived week. Returns the number of entries
  /// touched.
  pub async fn set_pinned(
    &self,
    guild_id: i64,
    date: DateTime,
    pinned: bool,
  ) -> Result<u64> {
    use sea_orm::sea_query::Expr;

    let result = weekly_history::Entity::update_many()
      .col_expr(weekly_history::Column::Pinned, Expr::value(pinned))
      .filter(weekly_history::Column::GuildId.eq(guild_id))
      .filter(weekly_history::Column::ArchiveDate.eq(date))
      .exec(self.db)
      .await?;
    Ok(result.rows_affected)
  }

  /// Delete unpinned entries older than the retention window.
  pub async fn cleanup(
    &self,
    guild_id: i64,
    retention_days: i32,
    now: DateTime,
  ) -> Result<u64> {
    let cutoff = now - TimeDelta::days(retention_days as i64);

    let result = weekly_history::Entity::delete_many()
      .filter(weekly_history::Column::GuildId.eq(guild_id))
      .filter(weekly_history::Column::Pinned.eq(false))
      .filter(weekly_history::Column::ArchiveDate.lt(cutoff))
      .exec(self.db)
      .await?;
    Ok(result.rows_affected)
  }

  pub async fn set_config(
    &self,
    guild_id: i64,
    post_channel_id: Option<i64>,
    retention_days: i32,
  ) -> Result<()> {
    let txn = self.db.begin().await?;

    history_config::Entity::delete_by_id(guild_id).exec(&txn).await?;
    history_config::ActiveModel {
      guild_id: Set(guild_id),
      post_channel_id: Set(post_channel_id),
      retention_days: Set(retention_days),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(())
  }

  pub async fn config(
    &self,
    guild_id: i64,
  ) -> Result<Option<history_config::Model>> {
    let config =
      history_config::Entity::find_by_id(guild_id).one(self.db).await?;
    Ok(config)
  }
}

use crate::{
  entity::{reset_state, session, total_time},
  prelude::*,
};

/// Result of folding an open session into the accumulated total.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
  pub started_at: DateTime,
  pub duration_seconds: i64,
  pub total_seconds: i64,
}

pub struct Session<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Session<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Open a session for (user, guild), unconditionally replacing a stale
  /// one. Any time tracked by the replaced session is discarded.
  pub async fn start(
    &self,
    user_id: i64,
    guild_id: i64,
    channel_id: i64,
    now: DateTime,
  ) -> Result<()> {
    let txn = self.db.begin().await?;

    session::Entity::delete_by_id((user_id, guild_id)).exec(&txn).await?;
    session::ActiveModel {
      user_id: Set(user_id),
      guild_id: Set(guild_id),
      channel_id: Set(channel_id),
      start_time: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(())
  }

  /// Close the open session and add its elapsed time to the accumulated
  /// total. `None` when there is no open session. Runs the total update
  /// and the session delete in one transaction so a crash cannot
  /// double-count or lose the span.
  pub async fn end(
    &self,
    user_id: i64,
    guild_id: i64,
    now: DateTime,
  ) -> Result<Option<ClosedSession>> {
    let txn = self.db.begin().await?;

    let Some(open) =
      session::Entity::find_by_id((user_id, guild_id)).one(&txn).await?
    else {
      return Ok(None);
    };

    // clock skew can produce a negative span; clamp instead of erroring
    let duration = (now - open.start_time).num_seconds().max(0);

    let total = match total_time::Entity::find_by_id((user_id, guild_id))
      .one(&txn)
      .await?
    {
      Some(row) => {
        let total = row.total_seconds + duration;
        total_time::ActiveModel { total_seconds: Set(total), ..row.into() }
          .update(&txn)
          .await?;
        total
      }
      None => {
        total_time::ActiveModel {
          user_id: Set(user_id),
          guild_id: Set(guild_id),
          total_seconds: Set(duration),
        }
        .insert(&txn)
        .await?;
        duration
      }
    };

    session::Entity::delete_by_id((user_id, guild_id)).exec(&txn).await?;
    txn.commit().await?;

    Ok(Some(ClosedSession {
      started_at: open.start_time,
      duration_seconds: duration,
      total_seconds: total,
    }))
  }

  /// Seconds elapsed in the open session, truncated at the most recent
  /// weekly reset so pre-reset time is not counted into the new week.
  pub async fn current_seconds(
    &self,
    user_id: i64,
    guild_id: i64,
    now: DateTime,
  ) -> Result<i64> {
    let Some(open) =
      session::Entity::find_by_id((user_id, guild_id)).one(self.db).await?
    else {
      return Ok(0);
    };

    let mut start = open.start_time;
    if let Some(state) =
      reset_state::Entity::find_by_id(guild_id).one(self.db).await?
      && state.last_reset > start
    {
      start = state.last_reset;
    }

    Ok((now - start).num_seconds().max(0))
  }

  pub async fn total_seconds(
    &self,
    user_id: i64,
    guild_id: i64,
  ) -> Result<i64> {
    let row =
      total_time::Entity::find_by_id((user_id, guild_id)).one(self.db).await?;
    Ok(row.map(|row| row.total_seconds).unwrap_or(0))
  }

  /// User ids with an open session in the guild.
  pub async fn active_users(&self, guild_id: i64) -> Result<Vec<i64>> {
    let rows = session::Entity::find()
      .filter(session::Column::GuildId.eq(guild_id))
      .all(self.db)
      .await?;
    Ok(rows.into_iter().map(|row| row.user_id).collect())
  }

  /// Guild ids that currently have at least one open session.
  pub async fn active_guilds(&self) -> Result<Vec<i64>> {
    let guilds: Vec<i64> = session::Entity::find()
      .select_only()
      .column(session::Column::GuildId)
      .distinct()
      .into_tuple()
      .all(self.db)
      .await?;
    Ok(guilds)
  }

  /// 1-based position by accumulated time, `None` when the user has no
  /// accumulated row. Ties fall back to the store's natural order.
  pub async fn rank(&self, user_id: i64, guild_id: i64) -> Result<Option<u64>> {
    let rows = self.leaderboard(guild_id).await?;
    Ok(
      rows
        .iter()
        .position(|row| row.user_id == user_id)
        .map(|index| index as u64 + 1),
    )
  }

  pub async fn leaderboard(
    &self,
    guild_id: i64,
  ) -> Result<Vec<total_time::Model>> {
    let rows = total_time::Entity::find()
      .filter(total_time::Column::GuildId.eq(guild_id))
      .order_by_desc(total_time::Column::TotalSeconds)
      .all(self.db)
      .await?;
    Ok(rows)
  }
}

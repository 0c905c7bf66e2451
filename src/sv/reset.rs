use crate::{
  entity::{awarded_goal, reset_config, reset_state, total_time, weekly_history},
  gateway::Gateway,
  prelude::*,
  sv,
  sv::channel::GOAL_LOG,
  sv::history::DEFAULT_RETENTION_DAYS,
};

/// Reset schedules are interpreted in America/Sao_Paulo, which has been a
/// fixed UTC-3 since Brazil abolished DST in 2019.
const LOCAL_UTC_OFFSET_SECONDS: i64 = -3 * 3600;

/// Next future instant (UTC) matching the configured local weekday, hour
/// and minute; weekday 0 = Monday. `None` for an out-of-range hour/minute.
pub fn next_occurrence(
  now_utc: DateTime,
  weekday: i32,
  hour: u32,
  minute: u32,
) -> Option<DateTime> {
  let now_local = now_utc + TimeDelta::seconds(LOCAL_UTC_OFFSET_SECONDS);

  let days_ahead = (weekday as i64
    - now_local.weekday().num_days_from_monday() as i64)
    .rem_euclid(7);
  let mut target_local = (now_local.date() + TimeDelta::days(days_ahead))
    .and_hms_opt(hour, minute, 0)?;

  if target_local <= now_local {
    target_local += TimeDelta::days(7);
  }

  Some(target_local - TimeDelta::seconds(LOCAL_UTC_OFFSET_SECONDS))
}

/// Most recent occurrence at or before `now_utc`; the poll fires once this
/// instant moves past `last_reset`.
pub fn last_occurrence(
  now_utc: DateTime,
  weekday: i32,
  hour: u32,
  minute: u32,
) -> Option<DateTime> {
  next_occurrence(now_utc, weekday, hour, minute)
    .map(|next| next - TimeDelta::days(7))
}

/// Fire condition for a poll tick: the target window has been reached and
/// no reset has run for it yet. Guards against double-firing within one
/// window and against re-firing after a restart. An absent `last_reset`
/// does not fire; a freshly configured guild waits for its next
/// occurrence instead of resetting for the already-elapsed window.
pub fn due(now: DateTime, target: DateTime, last_reset: Option<DateTime>) -> bool {
  now >= target && last_reset.is_some_and(|last| last < target)
}

pub struct Reset<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Reset<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn set_config(
    &self,
    guild_id: i64,
    weekday: i32,
    hour: i32,
    minute: i32,
    now: DateTime,
  ) -> Result<()> {
    if !(0..7).contains(&weekday) {
      return Err(Error::InvalidArgs("weekday must be 0-6".into()));
    }
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
      return Err(Error::InvalidArgs("time must be HH:MM in 24h form".into()));
    }

    let txn = self.db.begin().await?;

    reset_config::Entity::delete_by_id(guild_id).exec(&txn).await?;
    reset_config::ActiveModel {
      guild_id: Set(guild_id),
      weekday: Set(weekday),
      hour: Set(hour),
      minute: Set(minute),
    }
    .insert(&txn)
    .await?;

    // seed the reset state so the scheduled instant already in the past
    // does not fire on the next poll tick
    if reset_state::Entity::find_by_id(guild_id).one(&txn).await?.is_none() {
      reset_state::ActiveModel { guild_id: Set(guild_id), last_reset: Set(now) }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(())
  }

  pub async fn config(
    &self,
    guild_id: i64,
  ) -> Result<Option<reset_config::Model>> {
    let config =
      reset_config::Entity::find_by_id(guild_id).one(self.db).await?;
    Ok(config)
  }

  pub async fn clear_config(&self, guild_id: i64) -> Result<()> {
    reset_config::Entity::delete_by_id(guild_id).exec(self.db).await?;
    Ok(())
  }

  /// Every guild with a scheduled reset.
  pub async fn configured_guilds(&self) -> Result<Vec<reset_config::Model>> {
    Ok(reset_config::Entity::find().all(self.db).await?)
  }

  pub async fn last_reset(&self, guild_id: i64) -> Result<Option<DateTime>> {
    let state = reset_state::Entity::find_by_id(guild_id).one(self.db).await?;
    Ok(state.map(|state| state.last_reset))
  }

  pub async fn set_last_reset(
    &self,
    guild_id: i64,
    now: DateTime,
  ) -> Result<()> {
    let txn = self.db.begin().await?;

    reset_state::Entity::delete_by_id(guild_id).exec(&txn).await?;
    reset_state::ActiveModel { guild_id: Set(guild_id), last_reset: Set(now) }
      .insert(&txn)
      .await?;

    txn.commit().await?;
    Ok(())
  }

  /// The weekly rollover for one guild: flush open sessions, archive the
  /// standings, clear totals and resettable awards, prune old history,
  /// record the reset instant and announce. Also the entry point for a
  /// forced reset, which bypasses the fire condition.
  pub async fn run_for_guild(
    &self,
    gateway: &dyn Gateway,
    guild_id: i64,
    now: DateTime,
  ) -> Result<()> {
    let session = sv::Session::new(self.db);
    let history = sv::History::new(self.db);

    // fold live in-progress time into the totals before archiving
    for user_id in session.active_users(guild_id).await? {
      session.end(user_id, guild_id, now).await?;
    }

    let archived = history.archive(guild_id, now).await?;

    let goals = sv::Goal::new(self.db).list(guild_id).await?;
    let resettable: Vec<i32> =
      goals.iter().filter(|goal| goal.reset_on_weekly).map(|goal| goal.id).collect();

    let txn = self.db.begin().await?;
    total_time::Entity::delete_many()
      .filter(total_time::Column::GuildId.eq(guild_id))
      .exec(&txn)
      .await?;
    if !resettable.is_empty() {
      awarded_goal::Entity::delete_many()
        .filter(awarded_goal::Column::GuildId.eq(guild_id))
        .filter(awarded_goal::Column::GoalId.is_in(resettable))
        .exec(&txn)
        .await?;
    }
    txn.commit().await?;

    let config = history.config(guild_id).await?;
    let retention = config
      .as_ref()
      .map(|config| config.retention_days)
      .unwrap_or(DEFAULT_RETENTION_DAYS);
    history.cleanup(guild_id, retention, now).await?;

    self.set_last_reset(guild_id, now).await?;

    if let Some(channel_id) =
      sv::Channel::new(self.db).log_channel(guild_id, GOAL_LOG).await?
      && let Err(err) = gateway
        .send_message(
          channel_id,
          "🔁 Weekly reset complete. Everyone's voice time starts from zero.",
        )
        .await
    {
      warn!(guild = guild_id, "reset announcement failed: {err}");
    }

    if let Some(post_channel) = config.and_then(|config| config.post_channel_id)
    {
      let standings = history.by_date(guild_id, now).await?;
      if !standings.is_empty()
        && let Err(err) = gateway
          .send_message(post_channel, &standings_message(now, &standings))
          .await
      {
        warn!(guild = guild_id, "standings post failed: {err}");
      }
    }

    info!(guild = guild_id, archived, "weekly reset executed");
    Ok(())
  }
}

fn standings_message(
  date: DateTime,
  rows: &[weekly_history::Model],
) -> String {
  let mut text =
    format!("🏆 Final weekly standings — {}\n", utils::fmt_date(date));
  for (index, row) in rows.iter().take(20).enumerate() {
    text.push_str(&format!(
      "{}. <@{}> — {}\n",
      index + 1,
      row.user_id,
      utils::fmt_hms(row.total_seconds),
    ));
  }
  text
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use sea_orm::{ConnectionTrait, Database, DbBackend, Schema};

  use super::*;
  use crate::{entity::*, gateway::mock::MockGateway};

  async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();

    let schema = Schema::new(DbBackend::Sqlite);
    for stmt in [
      schema.create_table_from_entity(session::Entity),
      schema.create_table_from_entity(total_time::Entity),
      schema.create_table_from_entity(goal::Entity),
      schema.create_table_from_entity(awarded_goal::Entity),
      schema.create_table_from_entity(reset_config::Entity),
      schema.create_table_from_entity(reset_state::Entity),
      schema.create_table_from_entity(weekly_history::Entity),
      schema.create_table_from_entity(history_config::Entity),
      schema.create_table_from_entity(log_channel::Entity),
    ] {
      db.execute(db.get_database_backend().build(&stmt)).await.unwrap();
    }

    db
  }

  fn local(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime {
    // UTC-3: local wall time plus three hours gives the UTC instant
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(hh, mm, 0).unwrap()
      + TimeDelta::hours(3)
  }

  fn at(secs: i64) -> DateTime {
    chrono::DateTime::from_timestamp(1_700_000_000 + secs, 0)
      .unwrap()
      .naive_utc()
  }

  #[test]
  fn test_next_occurrence_same_week() {
    // Saturday 2026-01-10 22:01 local; reset Sunday (6) 22:00 local
    let now = local(2026, 1, 10, 22, 1);
    let target = next_occurrence(now, 6, 22, 0).unwrap();

    assert_eq!(target, local(2026, 1, 11, 22, 0));
  }

  #[test]
  fn test_next_occurrence_rolls_a_full_week() {
    // Sunday 22:01 local, one minute past the configured instant
    let now = local(2026, 1, 11, 22, 1);
    let target = next_occurrence(now, 6, 22, 0).unwrap();

    assert_eq!(target, local(2026, 1, 18, 22, 0));
  }

  #[test]
  fn test_next_occurrence_rejects_bad_time() {
    assert_eq!(next_occurrence(local(2026, 1, 10, 12, 0), 6, 24, 0), None);
  }

  #[test]
  fn test_fire_guard() {
    let target = local(2026, 1, 11, 22, 0);
    let before = local(2026, 1, 11, 21, 59);
    let after = local(2026, 1, 11, 22, 1);

    assert!(!due(before, target, Some(target - TimeDelta::days(7))));
    // a reset already ran for this window
    assert!(!due(after, target, Some(after)));
    // no recorded reset yet: wait for the next occurrence
    assert!(!due(after, target, None));
    // the previous window's reset does not block this one
    assert!(due(after, target, Some(target - TimeDelta::days(7))));
  }

  #[test]
  fn test_last_occurrence_is_at_or_before_now() {
    let now = local(2026, 1, 10, 22, 1);
    let last = last_occurrence(now, 6, 22, 0).unwrap();

    assert_eq!(last, local(2026, 1, 4, 22, 0));
    assert!(last <= now);
  }

  #[tokio::test]
  async fn test_config_validation() {
    let db = setup_test_db().await;
    let sv = Reset::new(&db);

    assert!(matches!(
      sv.set_config(10, 7, 0, 0, at(0)).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.set_config(10, 0, 24, 0, at(0)).await,
      Err(Error::InvalidArgs(_))
    ));

    sv.set_config(10, 6, 22, 0, at(0)).await.unwrap();
    sv.set_config(10, 0, 8, 30, at(100)).await.unwrap();

    let config = sv.config(10).await.unwrap().unwrap();
    assert_eq!((config.weekday, config.hour, config.minute), (0, 8, 30));

    sv.clear_config(10).await.unwrap();
    assert!(sv.config(10).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_fresh_config_waits_for_next_occurrence() {
    let db = setup_test_db().await;
    let sv = Reset::new(&db);

    // Saturday 22:01 local; reset scheduled for Sunday (6) 22:00 local
    let now = local(2026, 1, 10, 22, 1);
    sv.set_config(10, 6, 22, 0, now).await.unwrap();

    // configuring seeds the state, so last week's occurrence cannot fire
    let last = sv.last_reset(10).await.unwrap();
    assert_eq!(last, Some(now));
    let target = last_occurrence(now, 6, 22, 0).unwrap();
    assert!(!due(now, target, last));

    // the following day's occurrence fires as scheduled
    let sunday = local(2026, 1, 11, 22, 0);
    let target = last_occurrence(sunday, 6, 22, 0).unwrap();
    assert_eq!(target, sunday);
    assert!(due(sunday, target, last));

    // reconfiguring keeps the existing state intact
    sv.set_config(10, 0, 8, 30, local(2026, 1, 10, 23, 0)).await.unwrap();
    assert_eq!(sv.last_reset(10).await.unwrap(), Some(now));
  }

  #[tokio::test]
  async fn test_reset_run_full_cycle() {
    let db = setup_test_db().await;
    let sv = Reset::new(&db);
    let sessions = sv::Session::new(&db);
    let goals = sv::Goal::new(&db);
    let gateway = MockGateway::default();

    sv::Channel::new(&db).set_log_channel(10, 900, GOAL_LOG).await.unwrap();

    // one closed span, one still open at reset time
    sessions.start(1, 10, 100, at(0)).await.unwrap();
    sessions.end(1, 10, at(600)).await.unwrap();
    sessions.start(2, 10, 100, at(500)).await.unwrap();

    let weekly = goals.add(10, "weekly", 60, None, &[], true).await.unwrap();
    let forever =
      goals.add(10, "forever", 60, None, &[], false).await.unwrap();
    goals.mark_awarded(1, 10, weekly.id, at(600)).await.unwrap();
    goals.mark_awarded(1, 10, forever.id, at(600)).await.unwrap();

    let reset_at = at(1000);
    sv.run_for_guild(&gateway, 10, reset_at).await.unwrap();

    // open session flushed into the archive, then everything cleared
    let archive = sv::History::new(&db).by_date(10, reset_at).await.unwrap();
    let archived: Vec<(i64, i64)> =
      archive.iter().map(|row| (row.user_id, row.total_seconds)).collect();
    assert_eq!(archived, vec![(1, 600), (2, 500)]);

    assert_eq!(sessions.total_seconds(1, 10).await.unwrap(), 0);
    assert_eq!(sessions.total_seconds(2, 10).await.unwrap(), 0);
    assert!(sessions.active_users(10).await.unwrap().is_empty());

    // only the resettable award is revoked
    assert!(!goals.has_award(1, 10, weekly.id).await.unwrap());
    assert!(goals.has_award(1, 10, forever.id).await.unwrap());

    assert_eq!(sv.last_reset(10).await.unwrap(), Some(reset_at));
    assert_eq!(gateway.messages().len(), 1);
    assert_eq!(gateway.messages()[0].0, 900);
  }

  #[tokio::test]
  async fn test_reset_posts_standings_when_configured() {
    let db = setup_test_db().await;
    let sv = Reset::new(&db);
    let gateway = MockGateway::default();

    sv::History::new(&db).set_config(10, Some(950), 90).await.unwrap();
    total_time::ActiveModel {
      user_id: Set(1),
      guild_id: Set(10),
      total_seconds: Set(3661),
    }
    .insert(&db)
    .await
    .unwrap();

    sv.run_for_guild(&gateway, 10, at(0)).await.unwrap();

    let messages = gateway.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, 950);
    assert!(messages[0].1.contains("01:01:01"));
  }

  #[tokio::test]
  async fn test_reset_leaves_other_guilds_alone() {
    let db = setup_test_db().await;
    let sv = Reset::new(&db);
    let sessions = sv::Session::new(&db);
    let gateway = MockGateway::default();

    sessions.start(1, 10, 100, at(0)).await.unwrap();
    sessions.end(1, 10, at(600)).await.unwrap();
    sessions.start(1, 11, 100, at(0)).await.unwrap();
    sessions.end(1, 11, at(700)).await.unwrap();

    sv.run_for_guild(&gateway, 10, at(1000)).await.unwrap();

    assert_eq!(sessions.total_seconds(1, 10).await.unwrap(), 0);
    assert_eq!(sessions.total_seconds(1, 11).await.unwrap(), 700);
  }
}

use crate::{
  entity::{awarded_goal, goal},
  gateway::Gateway,
  prelude::*,
  sv,
  sv::channel::GOAL_LOG,
};

/// Result of a bulk retroactive notify run for one goal.
#[derive(Debug, Default, PartialEq)]
pub struct NotifyOutcome {
  pub newly_awarded: usize,
  pub notified: usize,
  pub failed: usize,
}

pub struct Goal<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Goal<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn add(
    &self,
    guild_id: i64,
    name: &str,
    seconds_required: i64,
    reward_role_id: Option<i64>,
    required_role_ids: &[i64],
    reset_on_weekly: bool,
  ) -> Result<goal::Model> {
    if seconds_required <= 0 {
      return Err(Error::InvalidArgs(
        "seconds_required must be positive".into(),
      ));
    }

    let csv = (!required_role_ids.is_empty()).then(|| {
      required_role_ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
    });

    let goal = goal::ActiveModel {
      guild_id: Set(guild_id),
      name: Set(name.to_string()),
      seconds_required: Set(seconds_required),
      reward_role_id: Set(reward_role_id),
      required_role_ids: Set(csv),
      reset_on_weekly: Set(reset_on_weekly),
      ..Default::default()
    };

    Ok(goal.insert(self.db).await?)
  }

  /// Remove a goal together with its award records.
  pub async fn remove(&self, guild_id: i64, goal_id: i32) -> Result<()> {
    let txn = self.db.begin().await?;

    goal::Entity::delete_many()
      .filter(goal::Column::GuildId.eq(guild_id))
      .filter(goal::Column::Id.eq(goal_id))
      .exec(&txn)
      .await?;
    awarded_goal::Entity::delete_many()
      .filter(awarded_goal::Column::GuildId.eq(guild_id))
      .filter(awarded_goal::Column::GoalId.eq(goal_id))
      .exec(&txn)
      .await?;

    txn.commit().await?;
    Ok(())
  }

  /// All goals of the guild in ascending required-time order.
  pub async fn list(&self, guild_id: i64) -> Result<Vec<goal::Model>> {
    let goals = goal::Entity::find()
      .filter(goal::Column::GuildId.eq(guild_id))
      .order_by_asc(goal::Column::SecondsRequired)
      .order_by_asc(goal::Column::Id)
      .all(self.db)
      .await?;
    Ok(goals)
  }

  pub async fn by_id(
    &self,
    guild_id: i64,
    goal_id: i32,
  ) -> Result<Option<goal::Model>> {
    let goal = goal::Entity::find_by_id(goal_id)
      .filter(goal::Column::GuildId.eq(guild_id))
      .one(self.db)
      .await?;
    Ok(goal)
  }

  pub async fn set_reset_flag(
    &self,
    guild_id: i64,
    goal_id: i32,
    reset_on_weekly: bool,
  ) -> Result<()> {
    let goal =
      self.by_id(guild_id, goal_id).await?.ok_or(Error::GoalNotFound)?;

    goal::ActiveModel { reset_on_weekly: Set(reset_on_weekly), ..goal.into() }
      .update(self.db)
      .await?;
    Ok(())
  }

  pub async fn has_award(
    &self,
    user_id: i64,
    guild_id: i64,
    goal_id: i32,
  ) -> Result<bool> {
    let row = awarded_goal::Entity::find_by_id((user_id, guild_id, goal_id))
      .one(self.db)
      .await?;
    Ok(row.is_some())
  }

  pub async fn mark_awarded(
    &self,
    user_id: i64,
    guild_id: i64,
    goal_id: i32,
    now: DateTime,
  ) -> Result<()> {
    if self.has_award(user_id, guild_id, goal_id).await? {
      return Ok(());
    }

    awarded_goal::ActiveModel {
      user_id: Set(user_id),
      guild_id: Set(guild_id),
      goal_id: Set(goal_id),
      awarded_at: Set(now),
    }
    .insert(self.db)
    .await?;
    Ok(())
  }

  pub async fn award_count(&self, guild_id: i64, goal_id: i32) -> Result<u64> {
    let count = awarded_goal::Entity::find()
      .filter(awarded_goal::Column::GuildId.eq(guild_id))
      .filter(awarded_goal::Column::GoalId.eq(goal_id))
      .count(self.db)
      .await?;
    Ok(count)
  }

  /// User ids awarded the goal, in award order.
  pub async fn awarded_users(
    &self,
    guild_id: i64,
    goal_id: i32,
  ) -> Result<Vec<i64>> {
    let rows = awarded_goal::Entity::find()
      .filter(awarded_goal::Column::GuildId.eq(guild_id))
      .filter(awarded_goal::Column::GoalId.eq(goal_id))
      .order_by_asc(awarded_goal::Column::AwardedAt)
      .all(self.db)
      .await?;
    Ok(rows.into_iter().map(|row| row.user_id).collect())
  }

  /// Evaluate every goal of the guild against the user's effective time
  /// (accumulated plus in-progress) and award the ones now satisfied.
  /// Returns the goals awarded by this run.
  pub async fn check_and_award(
    &self,
    gateway: &dyn Gateway,
    user_id: i64,
    guild_id: i64,
    now: DateTime,
  ) -> Result<Vec<goal::Model>> {
    let goals = self.list(guild_id).await?;
    if goals.is_empty() {
      return Ok(Vec::new());
    }

    let session = sv::Session::new(self.db);
    let total = session.total_seconds(user_id, guild_id).await?;
    let current = session.current_seconds(user_id, guild_id, now).await?;
    let effective = total + current;

    let member_roles: HashSet<i64> =
      match gateway.member_roles(guild_id, user_id).await {
        Ok(roles) => roles.into_iter().collect(),
        Err(err) => {
          warn!(user = user_id, guild = guild_id, "member lookup failed: {err}");
          return Ok(Vec::new());
        }
      };

    let goallog =
      sv::Channel::new(self.db).log_channel(guild_id, GOAL_LOG).await?;

    let mut awarded = Vec::new();
    for goal in goals {
      match self
        .try_award(gateway, &goal, user_id, guild_id, effective, &member_roles, goallog, now)
        .await
      {
        Ok(true) => awarded.push(goal),
        Ok(false) => {}
        // one failing goal must not abort the remaining ones
        Err(err) => {
          warn!(goal = goal.id, user = user_id, "goal evaluation failed: {err}")
        }
      }
    }

    Ok(awarded)
  }

  #[allow(clippy::too_many_arguments)]
  async fn try_award(
    &self,
    gateway: &dyn Gateway,
    goal: &goal::Model,
    user_id: i64,
    guild_id: i64,
    effective_seconds: i64,
    member_roles: &HashSet<i64>,
    goallog: Option<i64>,
    now: DateTime,
  ) -> Result<bool> {
    if self.has_award(user_id, guild_id, goal.id).await? {
      return Ok(false);
    }
    if effective_seconds < goal.seconds_required {
      return Ok(false);
    }

    // holding any one of the required roles qualifies
    let required = goal.required_roles();
    if !required.is_empty() && required.is_disjoint(member_roles) {
      return Ok(false);
    }

    self.mark_awarded(user_id, guild_id, goal.id, now).await?;

    if let Some(role_id) = goal.reward_role_id
      && let Err(err) = gateway.grant_role(guild_id, user_id, role_id).await
    {
      // the award record stands even when the grant fails
      warn!(goal = goal.id, "reward role grant failed: {err}");
    }

    if let Some(channel_id) = goallog {
      let ordinal = self.award_count(guild_id, goal.id).await?;
      let text = award_message(user_id, goal, ordinal);
      if let Err(err) = gateway.send_message(channel_id, &text).await {
        warn!(goal = goal.id, "goal announcement failed: {err}");
      }
    }

    Ok(true)
  }

  /// Retroactively award and announce one goal for every qualifying guild
  /// member. Announcements cover all awarded users (global ordinals) and
  /// are spaced by `delay` for the messaging rate limit.
  pub async fn notify_goal(
    &self,
    gateway: &dyn Gateway,
    guild_id: i64,
    goal_id: i32,
    delay: Duration,
    now: DateTime,
  ) -> Result<NotifyOutcome> {
    let goal =
      self.by_id(guild_id, goal_id).await?.ok_or(Error::GoalNotFound)?;
    let goallog = sv::Channel::new(self.db)
      .log_channel(guild_id, GOAL_LOG)
      .await?
      .ok_or_else(|| {
        Error::InvalidArgs("goal log channel is not configured".into())
      })?;

    let session = sv::Session::new(self.db);
    let mut outcome = NotifyOutcome::default();

    for member in gateway.guild_members(guild_id).await? {
      if let Some(role_id) = goal.reward_role_id {
        match gateway.member_roles(guild_id, member).await {
          // already holds the reward role, nothing to re-grant
          Ok(roles) if roles.contains(&role_id) => continue,
          Ok(_) => {}
          Err(err) => {
            warn!(user = member, "member lookup failed: {err}");
            outcome.failed += 1;
            continue;
          }
        }
      }

      let total = session.total_seconds(member, guild_id).await?;
      let current = session.current_seconds(member, guild_id, now).await?;
      if total + current < goal.seconds_required {
        continue;
      }

      if let Some(role_id) = goal.reward_role_id
        && let Err(err) = gateway.grant_role(guild_id, member, role_id).await
      {
        warn!(user = member, "reward role grant failed: {err}");
        outcome.failed += 1;
        continue;
      }

      if !self.has_award(member, guild_id, goal.id).await? {
        self.mark_awarded(member, guild_id, goal.id, now).await?;
        outcome.newly_awarded += 1;
      }
    }

    for (index, user_id) in
      self.awarded_users(guild_id, goal.id).await?.iter().enumerate()
    {
      let text = award_message(*user_id, &goal, index as u64 + 1);
      match gateway.send_message(goallog, &text).await {
        Ok(()) => outcome.notified += 1,
        Err(err) => {
          warn!(user = user_id, "goal announcement failed: {err}");
          outcome.failed += 1;
        }
      }
      time::sleep(delay).await;
    }

    Ok(outcome)
  }
}

fn award_message(user_id: i64, goal: &goal::Model, ordinal: u64) -> String {
  let role = goal
    .reward_role_id
    .map(|id| format!("<@&{id}>"))
    .unwrap_or_else(|| "—".into());

  format!(
    "🏅 <@{user_id}> just completed the goal \"{}\"!\n\
    - Reward role: {role}\n\
    - Required time: **{}**\n\
    - They were member **#{ordinal}** to complete it.",
    goal.name,
    utils::human_hours_minutes(goal.seconds_required),
  )
}

#[cfg(test)]
mod tests {
  use sea_orm::{ConnectionTrait, Database, DbBackend, Schema};

  use super::*;
  use crate::{entity::*, gateway::mock::MockGateway, sv::channel::GOAL_LOG};

  async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();

    let schema = Schema::new(DbBackend::Sqlite);
    for stmt in [
      schema.create_table_from_entity(goal::Entity),
      schema.create_table_from_entity(awarded_goal::Entity),
      schema.create_table_from_entity(session::Entity),
      schema.create_table_from_entity(total_time::Entity),
      schema.create_table_from_entity(reset_state::Entity),
      schema.create_table_from_entity(log_channel::Entity),
    ] {
      db.execute(db.get_database_backend().build(&stmt)).await.unwrap();
    }

    db
  }

  fn at(secs: i64) -> DateTime {
    chrono::DateTime::from_timestamp(1_700_000_000 + secs, 0)
      .unwrap()
      .naive_utc()
  }

  async fn set_total(db: &DatabaseConnection, user: i64, guild: i64, secs: i64) {
    let sv = sv::Session::new(db);
    sv.start(user, guild, 100, at(0)).await.unwrap();
    sv.end(user, guild, at(secs)).await.unwrap();
  }

  #[tokio::test]
  async fn test_awards_satisfied_goals_only() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway = MockGateway::with_member_roles(10, 1, &[]);

    sv.add(10, "one hour", 3600, None, &[], true).await.unwrap();
    sv.add(10, "two hours", 7200, None, &[], true).await.unwrap();
    set_total(&db, 1, 10, 3661).await;

    let awarded = sv.check_and_award(&gateway, 1, 10, at(3661)).await.unwrap();

    assert_eq!(awarded.len(), 1);
    assert_eq!(awarded[0].name, "one hour");
  }

  #[tokio::test]
  async fn test_award_is_idempotent() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway = MockGateway::with_member_roles(10, 1, &[]);

    let goal = sv.add(10, "goal", 60, Some(500), &[], true).await.unwrap();
    sv::Channel::new(&db).set_log_channel(10, 900, GOAL_LOG).await.unwrap();
    set_total(&db, 1, 10, 120).await;

    let first = sv.check_and_award(&gateway, 1, 10, at(120)).await.unwrap();
    let second = sv.check_and_award(&gateway, 1, 10, at(120)).await.unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(sv.award_count(10, goal.id).await.unwrap(), 1);
    assert_eq!(gateway.grants().len(), 1);
    assert_eq!(gateway.messages().len(), 1);
  }

  #[tokio::test]
  async fn test_required_roles_use_or_semantics() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    // member holds role A only; the goal requires A or B
    let gateway = MockGateway::with_member_roles(10, 1, &[11]);

    sv.add(10, "gated", 60, None, &[11, 22], true).await.unwrap();
    set_total(&db, 1, 10, 120).await;

    let awarded = sv.check_and_award(&gateway, 1, 10, at(120)).await.unwrap();
    assert_eq!(awarded.len(), 1);
  }

  #[tokio::test]
  async fn test_required_roles_block_without_any_match() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway = MockGateway::with_member_roles(10, 1, &[33]);

    sv.add(10, "gated", 60, None, &[11, 22], true).await.unwrap();
    set_total(&db, 1, 10, 120).await;

    let awarded = sv.check_and_award(&gateway, 1, 10, at(120)).await.unwrap();
    assert!(awarded.is_empty());
  }

  #[tokio::test]
  async fn test_award_stands_when_grant_fails() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway = MockGateway {
      fail_grants: true,
      ..MockGateway::with_member_roles(10, 1, &[])
    };

    let goal = sv.add(10, "goal", 60, Some(500), &[], true).await.unwrap();
    set_total(&db, 1, 10, 120).await;

    let awarded = sv.check_and_award(&gateway, 1, 10, at(120)).await.unwrap();

    assert_eq!(awarded.len(), 1);
    assert!(sv.has_award(1, 10, goal.id).await.unwrap());
    assert!(gateway.grants().is_empty());
  }

  #[tokio::test]
  async fn test_in_progress_time_counts_towards_goals() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway = MockGateway::with_member_roles(10, 1, &[]);

    sv.add(10, "goal", 3600, None, &[], true).await.unwrap();
    sv::Session::new(&db).start(1, 10, 100, at(0)).await.unwrap();

    // session still open, but effective time already crosses the bar
    let awarded = sv.check_and_award(&gateway, 1, 10, at(3700)).await.unwrap();
    assert_eq!(awarded.len(), 1);
  }

  #[tokio::test]
  async fn test_announcement_carries_ordinal() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);

    sv.add(10, "goal", 60, None, &[], true).await.unwrap();
    sv::Channel::new(&db).set_log_channel(10, 900, GOAL_LOG).await.unwrap();

    for (user, instant) in [(1, 100), (2, 200)] {
      let gateway = MockGateway::with_member_roles(10, user, &[]);
      set_total(&db, user, 10, instant).await;
      sv.check_and_award(&gateway, user, 10, at(instant)).await.unwrap();

      let messages = gateway.messages();
      assert_eq!(messages.len(), 1);
      assert_eq!(messages[0].0, 900);
    }

    assert_eq!(sv.award_count(10, 1).await.unwrap(), 2);
  }

  #[tokio::test]
  async fn test_notify_goal_bulk_awards_and_announces() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway = MockGateway::default();
    gateway.add_member(10, 1, &[]);
    gateway.add_member(10, 2, &[500]); // already holds the reward role
    gateway.add_member(10, 3, &[]);

    let goal = sv.add(10, "goal", 60, Some(500), &[], true).await.unwrap();
    sv::Channel::new(&db).set_log_channel(10, 900, GOAL_LOG).await.unwrap();
    set_total(&db, 1, 10, 120).await;
    set_total(&db, 3, 10, 30).await; // below the bar

    let outcome = sv
      .notify_goal(&gateway, 10, goal.id, Duration::ZERO, at(200))
      .await
      .unwrap();

    assert_eq!(outcome.newly_awarded, 1);
    assert_eq!(outcome.notified, 1);
    assert_eq!(outcome.failed, 0);
    assert_eq!(gateway.grants(), vec![(10, 1, 500)]);

    let messages = gateway.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains("#1"));
  }

  #[tokio::test]
  async fn test_notify_goal_counts_lookup_failures() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway =
      MockGateway { fail_role_lookups: true, ..MockGateway::default() };
    gateway.add_member(10, 1, &[]);

    let goal = sv.add(10, "goal", 60, Some(500), &[], true).await.unwrap();
    sv::Channel::new(&db).set_log_channel(10, 900, GOAL_LOG).await.unwrap();
    set_total(&db, 1, 10, 120).await;

    let outcome = sv
      .notify_goal(&gateway, 10, goal.id, Duration::ZERO, at(200))
      .await
      .unwrap();

    assert_eq!(outcome.newly_awarded, 0);
    assert_eq!(outcome.failed, 1);
    assert!(gateway.grants().is_empty());
  }

  #[tokio::test]
  async fn test_notify_goal_unknown_goal() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);
    let gateway = MockGateway::default();

    let result =
      sv.notify_goal(&gateway, 10, 42, Duration::ZERO, at(0)).await;
    assert!(matches!(result, Err(Error::GoalNotFound)));
  }

  #[tokio::test]
  async fn test_remove_goal_drops_awards() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);

    let goal = sv.add(10, "goal", 60, None, &[], true).await.unwrap();
    sv.mark_awarded(1, 10, goal.id, at(0)).await.unwrap();

    sv.remove(10, goal.id).await.unwrap();

    assert!(sv.by_id(10, goal.id).await.unwrap().is_none());
    assert!(!sv.has_award(1, 10, goal.id).await.unwrap());
  }

  #[tokio::test]
  async fn test_rejects_non_positive_threshold() {
    let db = setup_test_db().await;
    let sv = Goal::new(&db);

    assert!(matches!(
      sv.add(10, "bad", 0, None, &[], true).await,
      Err(Error::InvalidArgs(_))
    ));
  }
}

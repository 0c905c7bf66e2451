use std::env;

use crate::{
  gateway::{self, Gateway},
  migration::Migrator,
  prelude::*,
  sv,
};

use sea_orm_migration::MigratorTrait;

#[derive(Debug, Clone)]
pub struct Config {
  /// Interval of the periodic goal sweep over active sessions.
  pub sweep_interval: Duration,
  /// Interval of the weekly-reset due check.
  pub reset_poll: Duration,
  /// Pause between bulk goal announcements (messaging rate limit).
  pub notify_delay: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      sweep_interval: Duration::from_secs(180),
      reset_poll: Duration::from_secs(60),
      notify_delay: Duration::from_secs(1),
    }
  }
}

impl Config {
  pub fn from_env() -> Self {
    let defaults = Self::default();
    Self {
      sweep_interval: env_secs("SWEEP_INTERVAL_SECS", defaults.sweep_interval),
      reset_poll: env_secs("RESET_POLL_SECS", defaults.reset_poll),
      notify_delay: env_secs("NOTIFY_DELAY_SECS", defaults.notify_delay),
    }
  }
}

fn env_secs(key: &str, default: Duration) -> Duration {
  env::var(key)
    .ok()
    .and_then(|value| value.parse().ok())
    .map(Duration::from_secs)
    .unwrap_or(default)
}

pub struct Services<'a> {
  pub session: sv::Session<'a>,
  pub goal: sv::Goal<'a>,
  pub reset: sv::Reset<'a>,
  pub history: sv::History<'a>,
  pub channel: sv::Channel<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub token: String,
  pub config: Config,
  pub gateway: Arc<dyn Gateway>,
}

impl AppState {
  pub async fn new(db_url: &str, token: &str, config: Config) -> Self {
    info!("Connecting to database...");
    let db =
      Database::connect(db_url).await.expect("Failed to connect to database");

    info!("Running migrations...");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    Self {
      db,
      token: token.to_string(),
      config,
      gateway: Arc::new(gateway::Discord::new(token)),
    }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      session: sv::Session::new(&self.db),
      goal: sv::Goal::new(&self.db),
      reset: sv::Reset::new(&self.db),
      history: sv::History::new(&self.db),
      channel: sv::Channel::new(&self.db),
    }
  }
}

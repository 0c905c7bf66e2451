//! voicetime - voice session tracking with weekly goals
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Serenity for the Discord gateway
//! - Supervised background services for goal sweeps and the weekly reset
//! - Tokio for async runtime

mod entity;
mod error;
mod gateway;
mod migration;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use std::env;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::prelude::*;
use crate::state::{AppState, Config};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "voicetime=debug,sea_orm=warn,serenity=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url =
    env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:voicetime.db?mode=rwc".into());
  let token = env::var("DISCORD_TOKEN").expect("DISCORD_TOKEN not set");
  let config = Config::from_env();

  info!("Starting voicetime v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(&db_url, &token, config).await);
  let shutdown = CancellationToken::new();

  plugins::App::new(shutdown.clone())
    .register(plugins::discord::Plugin)
    .register(plugins::sweep::Plugin)
    .register(plugins::scheduler::Plugin)
    .run(app)
    .await;

  tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
  info!("Shutdown requested");
  shutdown.cancel();

  // give supervised services a moment to wind down
  time::sleep(Duration::from_millis(500)).await;
}

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{prelude::*, state::AppState};

/// Periodic goal sweep: users sitting in a call reach thresholds between
/// voice events, so their in-progress time is re-checked on an interval.
pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  async fn start(
    &self,
    app: Arc<AppState>,
    shutdown: CancellationToken,
  ) -> anyhow::Result<()> {
    let mut interval = time::interval(app.config.sweep_interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = shutdown.cancelled() => return Ok(()),
        _ = interval.tick() => {}
      }

      if let Err(err) = sweep(&app).await {
        error!("goal sweep failed: {err}");
      }
    }
  }
}

async fn sweep(app: &AppState) -> Result<()> {
  let sv = app.sv();
  let now = Utc::now().naive_utc();

  for guild_id in sv.session.active_guilds().await? {
    for user_id in sv.session.active_users(guild_id).await? {
      match sv.goal.check_and_award(&*app.gateway, user_id, guild_id, now).await
      {
        Ok(awarded) if !awarded.is_empty() => {
          info!(user = user_id, guild = guild_id, "goals reached mid-call");
        }
        Ok(_) => {}
        Err(err) => {
          warn!(user = user_id, guild = guild_id, "sweep check failed: {err}");
        }
      }
    }
  }

  Ok(())
}

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{prelude::*, state::AppState, sv::reset};

/// Weekly-reset scheduler: polls every configured guild and fires the
/// rollover once its scheduled instant has passed. Surviving a restart is
/// free since the last reset instant lives in the database.
pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  async fn start(
    &self,
    app: Arc<AppState>,
    shutdown: CancellationToken,
  ) -> anyhow::Result<()> {
    let mut interval = time::interval(app.config.reset_poll);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = shutdown.cancelled() => return Ok(()),
        _ = interval.tick() => {}
      }

      if let Err(err) = poll(&app).await {
        error!("reset poll failed: {err}");
      }
    }
  }
}

async fn poll(app: &AppState) -> Result<()> {
  let sv = app.sv();
  let now = Utc::now().naive_utc();

  for config in sv.reset.configured_guilds().await? {
    let Some(target) = reset::last_occurrence(
      now,
      config.weekday,
      config.hour as u32,
      config.minute as u32,
    ) else {
      warn!(guild = config.guild_id, "unusable reset schedule, skipping");
      continue;
    };

    let last = match sv.reset.last_reset(config.guild_id).await? {
      Some(last) => last,
      // schedule without state yet; start waiting for the next occurrence
      None => {
        sv.reset.set_last_reset(config.guild_id, now).await?;
        continue;
      }
    };
    if !reset::due(now, target, Some(last)) {
      continue;
    }

    info!(guild = config.guild_id, "weekly reset due, running");
    if let Err(err) =
      sv.reset.run_for_guild(&*app.gateway, config.guild_id, now).await
    {
      error!(guild = config.guild_id, "weekly reset failed: {err}");
    }
  }

  Ok(())
}

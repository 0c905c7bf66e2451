use std::sync::Arc;

use serenity::{
  client::{Client, Context, EventHandler},
  model::{gateway::GatewayIntents, gateway::Ready, voice::VoiceState},
};
use tokio_util::sync::CancellationToken;

use crate::{
  prelude::*,
  state::AppState,
  sv::channel::CALL_LOG,
};

pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  async fn start(
    &self,
    app: Arc<AppState>,
    shutdown: CancellationToken,
  ) -> anyhow::Result<()> {
    info!("Starting Discord gateway...");

    let intents = GatewayIntents::GUILDS
      | GatewayIntents::GUILD_VOICE_STATES
      | GatewayIntents::GUILD_MEMBERS;

    let mut client = Client::builder(&app.token, intents)
      .event_handler(Handler { app: app.clone() })
      .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
      shutdown.cancelled().await;
      shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
  }
}

struct Handler {
  app: Arc<AppState>,
}

#[async_trait::async_trait]
impl EventHandler for Handler {
  async fn ready(&self, _ctx: Context, ready: Ready) {
    info!("Connected as {}", ready.user.name);
  }

  async fn voice_state_update(
    &self,
    _ctx: Context,
    old: Option<VoiceState>,
    new: VoiceState,
  ) {
    if new.member.as_ref().is_some_and(|member| member.user.bot) {
      return;
    }
    let Some(guild_id) = new.guild_id else {
      return;
    };

    let user_id = new.user_id.get() as i64;
    let guild_id = guild_id.get() as i64;
    let before = old.and_then(|state| state.channel_id.map(|id| id.get() as i64));
    let after = new.channel_id.map(|id| id.get() as i64);

    if let Err(err) =
      handle_transition(&self.app, user_id, guild_id, before, after, Utc::now().naive_utc())
        .await
    {
      error!(user = user_id, guild = guild_id, "voice update failed: {err}");
    }
  }
}

/// Applies one voice-state transition to the tracker. Mute and deafen
/// toggles arrive with an unchanged channel and are ignored; a channel
/// move closes the old span and opens a new one.
async fn handle_transition(
  app: &AppState,
  user_id: i64,
  guild_id: i64,
  before: Option<i64>,
  after: Option<i64>,
  now: DateTime,
) -> Result<()> {
  if before == after {
    return Ok(());
  }

  let sv = app.sv();

  if before.is_some()
    && let Some(closed) = sv.session.end(user_id, guild_id, now).await?
  {
    debug!(
      user = user_id,
      guild = guild_id,
      seconds = closed.duration_seconds,
      "voice session closed"
    );

    let awarded =
      sv.goal.check_and_award(&*app.gateway, user_id, guild_id, now).await?;
    if !awarded.is_empty() {
      info!(user = user_id, goals = awarded.len(), "goals reached on leave");
    }

    if let Some(channel_id) = sv.channel.log_channel(guild_id, CALL_LOG).await?
    {
      let text = format!(
        "📴 <@{user_id}> left voice after {}",
        utils::fmt_hms(closed.duration_seconds),
      );
      if let Err(err) = app.gateway.send_message(channel_id, &text).await {
        warn!(guild = guild_id, "call log delivery failed: {err}");
      }
    }
  }

  if let Some(channel) = after {
    if sv.channel.is_prohibited(guild_id, channel).await? {
      debug!(user = user_id, channel, "channel excluded from tracking");
      return Ok(());
    }

    sv.session.start(user_id, guild_id, channel, now).await?;

    if let Some(channel_id) = sv.channel.log_channel(guild_id, CALL_LOG).await?
      && let Err(err) = app
        .gateway
        .send_message(
          channel_id,
          &format!("📞 <@{user_id}> joined <#{channel}>"),
        )
        .await
    {
      warn!(guild = guild_id, "call log delivery failed: {err}");
    }
  }

  Ok(())
}

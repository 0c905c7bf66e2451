//! Boundary to the chat platform: role membership, role grants and message
//! delivery. Services talk to this trait so the engine stays testable
//! without a live gateway connection.

use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};

use crate::prelude::*;

#[async_trait]
pub trait Gateway: Send + Sync {
  /// Role ids the member currently holds.
  async fn member_roles(&self, guild_id: i64, user_id: i64)
  -> Result<Vec<i64>>;

  async fn grant_role(
    &self,
    guild_id: i64,
    user_id: i64,
    role_id: i64,
  ) -> Result<()>;

  async fn send_message(&self, channel_id: i64, text: &str) -> Result<()>;

  /// Non-bot member ids of the guild.
  async fn guild_members(&self, guild_id: i64) -> Result<Vec<i64>>;
}

/// Discord implementation over the serenity HTTP client.
pub struct Discord {
  http: Arc<Http>,
}

impl Discord {
  pub fn new(token: &str) -> Self {
    Self { http: Arc::new(Http::new(token)) }
  }
}

fn gateway_err(err: serenity::Error) -> Error {
  Error::Gateway(err.to_string())
}

#[async_trait]
impl Gateway for Discord {
  async fn member_roles(
    &self,
    guild_id: i64,
    user_id: i64,
  ) -> Result<Vec<i64>> {
    let member = self
      .http
      .get_member(GuildId::new(guild_id as u64), UserId::new(user_id as u64))
      .await
      .map_err(gateway_err)?;
    Ok(member.roles.iter().map(|role| role.get() as i64).collect())
  }

  async fn grant_role(
    &self,
    guild_id: i64,
    user_id: i64,
    role_id: i64,
  ) -> Result<()> {
    self
      .http
      .add_member_role(
        GuildId::new(guild_id as u64),
        UserId::new(user_id as u64),
        RoleId::new(role_id as u64),
        Some("voice time goal reached"),
      )
      .await
      .map_err(gateway_err)
  }

  async fn send_message(&self, channel_id: i64, text: &str) -> Result<()> {
    ChannelId::new(channel_id as u64)
      .say(&self.http, text)
      .await
      .map_err(gateway_err)?;
    Ok(())
  }

  async fn guild_members(&self, guild_id: i64) -> Result<Vec<i64>> {
    let members = GuildId::new(guild_id as u64)
      .members(&self.http, None, None)
      .await
      .map_err(gateway_err)?;
    Ok(
      members
        .into_iter()
        .filter(|member| !member.user.bot)
        .map(|member| member.user.id.get() as i64)
        .collect(),
    )
  }
}

#[cfg(test)]
pub mod mock {
  use std::sync::Mutex;

  use super::*;

  /// Recording gateway for service tests.
  #[derive(Default)]
  pub struct MockGateway {
    pub roles: Mutex<HashMap<(i64, i64), Vec<i64>>>,
    pub members: Mutex<Vec<i64>>,
    pub granted: Mutex<Vec<(i64, i64, i64)>>,
    pub sent: Mutex<Vec<(i64, String)>>,
    pub fail_grants: bool,
    pub fail_role_lookups: bool,
  }

  impl MockGateway {
    pub fn with_member_roles(guild_id: i64, user_id: i64, roles: &[i64]) -> Self {
      let gateway = Self::default();
      gateway.roles.lock().unwrap().insert((guild_id, user_id), roles.to_vec());
      gateway.members.lock().unwrap().push(user_id);
      gateway
    }

    pub fn add_member(&self, guild_id: i64, user_id: i64, roles: &[i64]) {
      self.roles.lock().unwrap().insert((guild_id, user_id), roles.to_vec());
      self.members.lock().unwrap().push(user_id);
    }

    pub fn grants(&self) -> Vec<(i64, i64, i64)> {
      self.granted.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<(i64, String)> {
      self.sent.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl Gateway for MockGateway {
    async fn member_roles(
      &self,
      guild_id: i64,
      user_id: i64,
    ) -> Result<Vec<i64>> {
      if self.fail_role_lookups {
        return Err(Error::Gateway("member lookup refused".into()));
      }
      Ok(
        self
          .roles
          .lock()
          .unwrap()
          .get(&(guild_id, user_id))
          .cloned()
          .unwrap_or_default(),
      )
    }

    async fn grant_role(
      &self,
      guild_id: i64,
      user_id: i64,
      role_id: i64,
    ) -> Result<()> {
      if self.fail_grants {
        return Err(Error::Gateway("grant refused".into()));
      }
      self.granted.lock().unwrap().push((guild_id, user_id, role_id));
      self
        .roles
        .lock()
        .unwrap()
        .entry((guild_id, user_id))
        .or_default()
        .push(role_id);
      Ok(())
    }

    async fn send_message(&self, channel_id: i64, text: &str) -> Result<()> {
      self.sent.lock().unwrap().push((channel_id, text.to_string()));
      Ok(())
    }

    async fn guild_members(&self, _guild_id: i64) -> Result<Vec<i64>> {
      Ok(self.members.lock().unwrap().clone())
    }
  }
}

use crate::{
  entity::{log_channel, prohibited_channel},
  prelude::*,
};

/// Channel purpose for live call notices.
pub const CALL_LOG: &str = "calllog";
/// Channel purpose for goal and reset announcements.
pub const GOAL_LOG: &str = "goallog";

pub struct Channel<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Channel<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn set_log_channel(
    &self,
    guild_id: i64,
    channel_id: i64,
    channel_type: &str,
  ) -> Result<()> {
    let txn = self.db.begin().await?;

    log_channel::Entity::delete_by_id((guild_id, channel_type.to_string()))
      .exec(&txn)
      .await?;
    log_channel::ActiveModel {
      guild_id: Set(guild_id),
      channel_type: Set(channel_type.to_string()),
      channel_id: Set(channel_id),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(())
  }

  pub async fn log_channel(
    &self,
    guild_id: i64,
    channel_type: &str,
  ) -> Result<Option<i64>> {
    let row =
      log_channel::Entity::find_by_id((guild_id, channel_type.to_string()))
        .one(self.db)
        .await?;
    Ok(row.map(|row| row.channel_id))
  }

  pub async fn prohibit(&self, guild_id: i64, channel_id: i64) -> Result<()> {
    if self.is_prohibited(guild_id, channel_id).await? {
      return Ok(());
    }

    prohibited_channel::ActiveModel {
      guild_id: Set(guild_id),
      channel_id: Set(channel_id),
    }
    .insert(self.db)
    .await?;
    Ok(())
  }

  pub async fn allow(&self, guild_id: i64, channel_id: i64) -> Result<()> {
    prohibited_channel::Entity::delete_by_id((guild_id, channel_id))
      .exec(self.db)
      .await?;
    Ok(())
  }

  pub async fn prohibited(&self, guild_id: i64) -> Result<Vec<i64>> {
    let rows = prohibited_channel::Entity::find()
      .filter(prohibited_channel::Column::GuildId.eq(guild_id))
      .all(self.db)
      .await?;
    Ok(rows.into_iter().map(|row| row.channel_id).collect())
  }

  pub async fn is_prohibited(
    &self,
    guild_id: i64,
    channel_id: i64,
  ) -> Result<bool> {
    let row = prohibited_channel::Entity::find_by_id((guild_id, channel_id))
      .one(self.db)
      .await?;
    Ok(row.is_some())
  }
}

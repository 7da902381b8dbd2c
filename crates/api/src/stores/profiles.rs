//! Player profile cache for Redis (hashes).

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

use crate::models::PlayerProfile;

/// Cache of display fields used when rendering leaderboards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileCache: Send + Sync {
    /// Get a cached profile.
    async fn get(&self, user_id: i64) -> Result<Option<PlayerProfile>>;

    /// Cache a profile with TTL.
    async fn put(&self, profile: &PlayerProfile, ttl_secs: u64) -> Result<()>;
}

pub(crate) fn profile_key(user_id: i64) -> String {
    format!("cache:user:{}", user_id)
}

/// Flatten a profile into hash fields. An absent avatar is stored as "".
pub(crate) fn to_fields(profile: &PlayerProfile) -> Vec<(&'static str, String)> {
    vec![
        ("username", profile.username.clone()),
        ("avatar", profile.avatar.clone().unwrap_or_default()),
        ("level", profile.level.to_string()),
    ]
}

/// Rebuild a profile from hash fields. Missing or malformed fields count as a miss.
pub(crate) fn from_fields(user_id: i64, fields: &HashMap<String, String>) -> Option<PlayerProfile> {
    let username = fields.get("username")?.clone();
    let level = fields.get("level")?.parse().ok()?;
    let avatar = fields
        .get("avatar")
        .filter(|a| !a.is_empty())
        .cloned();

    Some(PlayerProfile {
        user_id,
        username,
        avatar,
        level,
    })
}

/// Redis implementation of ProfileCache.
#[derive(Clone)]
pub struct RedisProfileCache {
    client: redis::Client,
}

impl RedisProfileCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileCache for RedisProfileCache {
    async fn get(&self, user_id: i64) -> Result<Option<PlayerProfile>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let fields: HashMap<String, String> = conn.hgetall(profile_key(user_id)).await?;
        Ok(from_fields(user_id, &fields))
    }

    async fn put(&self, profile: &PlayerProfile, ttl_secs: u64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = profile_key(profile.user_id);

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(&key, &to_fields(profile))
            .ignore()
            .expire(&key, i64::try_from(ttl_secs)?)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

//! Bearer token storage for Redis.
//!
//! Tokens are opaque random strings. Only their SHA-256 digest is used as a key.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};

/// Store mapping issued bearer tokens to user ids.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Record a token for a user with TTL.
    async fn issue(&self, token: &str, user_id: i64, ttl_secs: u64) -> Result<()>;

    /// User id for a live token.
    async fn resolve(&self, token: &str) -> Result<Option<i64>>;

    /// Revoke a token.
    async fn revoke(&self, token: &str) -> Result<()>;
}

pub(crate) fn token_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("token:{}", hex::encode(hasher.finalize()))
}

/// Redis implementation of TokenStore.
#[derive(Clone)]
pub struct RedisTokenStore {
    client: redis::Client,
}

impl RedisTokenStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn issue(&self, token: &str, user_id: i64, ttl_secs: u64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.set_ex(token_key(token), user_id, ttl_secs).await?;
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let user_id: Option<i64> = conn.get(token_key(token)).await?;
        Ok(user_id)
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.del(token_key(token)).await?;
        Ok(())
    }
}

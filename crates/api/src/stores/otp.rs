//! One-time login code storage for Redis.
//!
//! Codes are stored as SHA-256 digests so a Redis dump does not leak live codes.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Store for login codes and their failed-attempt counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store the code digest for an email, replacing any previous one.
    async fn put_code(&self, email: &str, digest: &str, ttl_secs: u64) -> Result<()>;

    /// Get the live code digest for an email.
    async fn get_code(&self, email: &str) -> Result<Option<String>>;

    /// Delete the code for an email.
    async fn delete_code(&self, email: &str) -> Result<()>;

    /// Remaining lifetime of the code in seconds, None if no code is live.
    async fn code_ttl(&self, email: &str) -> Result<Option<u64>>;

    /// Current failed-attempt count (0 if none recorded).
    async fn failed_attempts(&self, email: &str) -> Result<u32>;

    /// Increment the failed-attempt count, returning the new value.
    async fn record_failure(&self, email: &str) -> Result<u32>;

    /// Set the lifetime of the failed-attempt counter.
    async fn expire_attempts(&self, email: &str, ttl_secs: u64) -> Result<()>;

    /// Clear the failed-attempt counter.
    async fn reset_attempts(&self, email: &str) -> Result<()>;
}

pub(crate) fn code_key(email: &str) -> String {
    format!("otp:{}", email)
}

pub(crate) fn attempts_key(email: &str) -> String {
    format!("otp:attempts:{}", email)
}

/// Redis implementation of OtpStore.
#[derive(Clone)]
pub struct RedisOtpStore {
    client: redis::Client,
}

impl RedisOtpStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn put_code(&self, email: &str, digest: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.set_ex(code_key(email), digest, ttl_secs).await?;
        Ok(())
    }

    async fn get_code(&self, email: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let digest: Option<String> = conn.get(code_key(email)).await?;
        Ok(digest)
    }

    async fn delete_code(&self, email: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.del(code_key(email)).await?;
        Ok(())
    }

    async fn code_ttl(&self, email: &str) -> Result<Option<u64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // -2: no such key, -1: no expiry. Codes are always written with one.
        let ttl: i64 = conn.ttl(code_key(email)).await?;
        Ok(u64::try_from(ttl).ok())
    }

    async fn failed_attempts(&self, email: &str) -> Result<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: Option<u32> = conn.get(attempts_key(email)).await?;
        Ok(count.unwrap_or(0))
    }

    async fn record_failure(&self, email: &str) -> Result<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: u32 = redis::cmd("INCR")
            .arg(attempts_key(email))
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    async fn expire_attempts(&self, email: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = redis::cmd("EXPIRE")
            .arg(attempts_key(email))
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn reset_attempts(&self, email: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.del(attempts_key(email)).await?;
        Ok(())
    }
}

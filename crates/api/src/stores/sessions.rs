//! Play session storage for Redis.
//!
//! A session is two keys written with the same TTL: the JSON payload and an
//! active-session marker per user. The marker is claimed with `SET NX`, so the
//! existence check and the write are a single atomic step. Settling a session
//! claims the payload with one atomic `TTL` + `DEL`, and the marker is only
//! deleted while it still names the session being settled.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

use crate::models::GameSession;

/// Store for play sessions and the per-user active-session marker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Claim the user's active-session marker if it is free.
    /// Returns false when another live session already holds it.
    async fn claim_active(&self, user_id: i64, session_id: &str, ttl_secs: u64) -> Result<bool>;

    /// Free the user's active-session marker if it still holds `session_id`.
    async fn release_active(&self, user_id: i64, session_id: &str) -> Result<()>;

    /// Store a session payload with TTL.
    async fn put_session(&self, session: &GameSession, ttl_secs: u64) -> Result<()>;

    /// Get a session payload by id.
    async fn get_session(&self, session_id: &str) -> Result<Option<GameSession>>;

    /// Remove a session payload. Returns its remaining TTL in seconds (at
    /// least 1) when this call removed it, `None` when it was already gone.
    async fn claim_session(&self, session_id: &str) -> Result<Option<u64>>;
}

/// Deletes KEYS[1] only while it holds ARGV[1].
const RELEASE_IF_HELD: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
";

pub(crate) fn session_key(session_id: &str) -> String {
    format!("game-session:{}", session_id)
}

pub(crate) fn active_key(user_id: i64) -> String {
    format!("active-session:user:{}", user_id)
}

/// Redis implementation of SessionStore.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn claim_active(&self, user_id: i64, session_id: &str, ttl_secs: u64) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let reply: Option<String> = redis::cmd("SET")
            .arg(active_key(user_id))
            .arg(session_id)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release_active(&self, user_id: i64, session_id: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: i64 = redis::Script::new(RELEASE_IF_HELD)
            .key(active_key(user_id))
            .arg(session_id)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn put_session(&self, session: &GameSession, ttl_secs: u64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(session)?;

        let _: () = conn
            .set_ex(session_key(&session.session_id), json, ttl_secs)
            .await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<GameSession>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let json: Option<String> = conn.get(session_key(session_id)).await?;

        match json {
            Some(j) => Ok(Some(serde_json::from_str(&j)?)),
            None => Ok(None),
        }
    }

    async fn claim_session(&self, session_id: &str) -> Result<Option<u64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = session_key(session_id);

        let (ttl, removed): (i64, u64) = redis::pipe()
            .atomic()
            .ttl(&key)
            .del(&key)
            .query_async(&mut conn)
            .await?;

        if removed == 0 {
            return Ok(None);
        }
        Ok(Some(u64::try_from(ttl).unwrap_or(0).max(1)))
    }
}

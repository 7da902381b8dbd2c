//! Recent match history for Redis (capped lists).

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Store for each player's most recent match ids.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchHistoryStore: Send + Sync {
    /// Push a match id to the front of the user's list, keeping at most `keep` entries.
    async fn push(&self, user_id: i64, match_id: i64, keep: usize) -> Result<()>;

    /// Match ids for the user, newest first.
    async fn recent(&self, user_id: i64) -> Result<Vec<i64>>;
}

pub(crate) fn history_key(user_id: i64) -> String {
    format!("matches:user:{}", user_id)
}

/// Redis implementation of MatchHistoryStore.
#[derive(Clone)]
pub struct RedisMatchHistoryStore {
    client: redis::Client,
}

impl RedisMatchHistoryStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MatchHistoryStore for RedisMatchHistoryStore {
    async fn push(&self, user_id: i64, match_id: i64, keep: usize) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = history_key(user_id);
        let stop = isize::try_from(keep)? - 1;

        let _: () = redis::pipe()
            .atomic()
            .lpush(&key, match_id)
            .ignore()
            .ltrim(&key, 0, stop)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn recent(&self, user_id: i64) -> Result<Vec<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let ids: Vec<i64> = conn.lrange(history_key(user_id), 0, -1).await?;
        Ok(ids)
    }
}

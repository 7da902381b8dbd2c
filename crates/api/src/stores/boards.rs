//! Ranking boards for Redis (sorted sets).
//!
//! Members with equal scores are ordered by Redis itself: lexicographically by
//! member, reversed for the descending queries used here. The order is stable
//! across calls for the same board contents.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Store for sorted-set ranking boards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Health check - verify Redis connectivity.
    async fn health_check(&self) -> Result<bool>;

    /// Atomically add `delta` to a member's score, creating it if absent.
    /// Returns the new score.
    async fn increment(&self, board: &str, member: &str, delta: f64) -> Result<f64>;

    /// 0-based position from the top, or None if the member is absent.
    async fn reverse_rank(&self, board: &str, member: &str) -> Result<Option<u64>>;

    /// Current score of a member.
    async fn score(&self, board: &str, member: &str) -> Result<Option<f64>>;

    /// Highest `count` members with their scores, best first.
    async fn top(&self, board: &str, count: usize) -> Result<Vec<(String, f64)>>;

    /// Number of members on the board (0 if it does not exist).
    async fn cardinality(&self, board: &str) -> Result<u64>;
}

/// Redis implementation of BoardStore.
#[derive(Clone)]
pub struct RedisBoardStore {
    client: redis::Client,
}

impl RedisBoardStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BoardStore for RedisBoardStore {
    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    async fn increment(&self, board: &str, member: &str, delta: f64) -> Result<f64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let score: f64 = conn.zincr(board, member, delta).await?;
        Ok(score)
    }

    async fn reverse_rank(&self, board: &str, member: &str) -> Result<Option<u64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let rank: Option<u64> = conn.zrevrank(board, member).await?;
        Ok(rank)
    }

    async fn score(&self, board: &str, member: &str) -> Result<Option<f64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let score: Option<f64> = conn.zscore(board, member).await?;
        Ok(score)
    }

    async fn top(&self, board: &str, count: usize) -> Result<Vec<(String, f64)>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let stop = isize::try_from(count - 1)?;

        let entries: Vec<(String, f64)> = conn.zrevrange_withscores(board, 0, stop).await?;
        Ok(entries)
    }

    async fn cardinality(&self, board: &str) -> Result<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: u64 = conn.zcard(board).await?;
        Ok(count)
    }
}

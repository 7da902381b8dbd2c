//! Match records for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use shared::api::MatchOutcome;
use sqlx::{Pool, Postgres};

use crate::models::MatchReport;

/// Persists finished matches and keeps per-player totals in step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchRecorder: Send + Sync {
    /// Store a finished match. Returns the new match id.
    async fn record(&self, user_id: i64, game_id: i64, report: &MatchReport) -> Result<i64>;

    /// Bump wins/losses/matches and total score. Returns the new total score.
    async fn update_aggregate_stats(
        &self,
        user_id: i64,
        result: MatchOutcome,
        score: u32,
    ) -> Result<i64>;
}

/// PostgreSQL implementation of MatchRecorder.
#[derive(Clone)]
pub struct PgMatchRecorder {
    pool: Pool<Postgres>,
}

impl PgMatchRecorder {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchRecorder for PgMatchRecorder {
    async fn record(&self, user_id: i64, game_id: i64, report: &MatchReport) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO matches (user_id, game_id, opponent_id, result, score, duration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .bind(report.opponent_id)
        .bind(report.result.as_str())
        .bind(i64::from(report.score))
        .bind(i64::from(report.duration))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_aggregate_stats(
        &self,
        user_id: i64,
        result: MatchOutcome,
        score: u32,
    ) -> Result<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE users SET
                total_matches = total_matches + 1,
                wins = wins + CASE WHEN $2 = 'WIN' THEN 1 ELSE 0 END,
                losses = losses + CASE WHEN $2 = 'LOSS' THEN 1 ELSE 0 END,
                total_score = total_score + $3
            WHERE id = $1
            RETURNING total_score
            "#,
        )
        .bind(user_id)
        .bind(result.as_str())
        .bind(i64::from(score))
        .fetch_optional(&self.pool)
        .await?;

        total.ok_or_else(|| anyhow::anyhow!("user {} vanished while recording a match", user_id))
    }
}

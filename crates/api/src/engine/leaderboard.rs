//! Multi-window leaderboard aggregation.
//!
//! Every score lands on four boards: global, today, this ISO week and,
//! optionally, the game's own board. Each increment is a single atomic
//! `ZINCRBY`; the sequence across boards is not. A failure partway through is
//! returned as [`EngineError::PartialScoreUpdate`] naming the boards that
//! already took the points. Nothing is rolled back.
//!
//! Ranks are Redis reverse ranks plus one. Members with equal scores are
//! ordered the way Redis orders them (member string, descending), which is
//! deterministic for a given board.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::error::EngineError;
use crate::stores::BoardStore;

pub const GLOBAL_BOARD: &str = "leaderboard:global";
const WEEKLY_PREFIX: &str = "leaderboard:weekly:";
const GAME_PREFIX: &str = "leaderboard:game:";
const MEMBER_PREFIX: &str = "user:";

/// One ranking scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    Global,
    Daily(NaiveDate),
    /// ISO week-numbering year and week.
    Weekly { year: i32, week: u32 },
    Game(i64),
}

impl Board {
    pub fn daily(now: DateTime<Utc>) -> Self {
        Board::Daily(now.date_naive())
    }

    pub fn weekly(now: DateTime<Utc>) -> Self {
        let iso = now.iso_week();
        Board::Weekly {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Redis key of the board.
    pub fn key(&self) -> String {
        match self {
            Board::Global => GLOBAL_BOARD.to_string(),
            Board::Daily(date) => format!("{}{}", GLOBAL_BOARD, date.format("%Y%m%d")),
            Board::Weekly { year, week } => format!("{}{}-W{:02}", WEEKLY_PREFIX, year, week),
            Board::Game(game_id) => format!("{}{}", GAME_PREFIX, game_id),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

pub fn member_key(user_id: i64) -> String {
    format!("{}{}", MEMBER_PREFIX, user_id)
}

pub fn parse_member(member: &str) -> Option<i64> {
    member.strip_prefix(MEMBER_PREFIX)?.parse().ok()
}

/// Scores are floats in Redis but always reported as whole points.
fn whole_points(score: f64) -> i64 {
    score.round() as i64
}

/// Result of [`LeaderboardEngine::add_score`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub user_id: i64,
    pub points_added: u32,
    pub new_global_score: i64,
    pub global_rank: u64,
    pub new_daily_score: i64,
    pub daily_rank: u64,
}

/// A raw board row: member key and rounded score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub member: String,
    pub score: i64,
}

/// Rank bucket derived from the absolute global rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Champion,
    Master,
    Diamond,
    Platinum,
    Gold,
    Silver,
    Bronze,
}

impl Tier {
    /// Tier for a 1-based rank.
    pub fn for_rank(rank: u64) -> Self {
        match rank {
            1 => Tier::Champion,
            2..=3 => Tier::Master,
            4..=10 => Tier::Diamond,
            11..=50 => Tier::Platinum,
            51..=100 => Tier::Gold,
            101..=500 => Tier::Silver,
            _ => Tier::Bronze,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Champion => "Champion",
            Tier::Master => "Master",
            Tier::Diamond => "Diamond",
            Tier::Platinum => "Platinum",
            Tier::Gold => "Gold",
            Tier::Silver => "Silver",
            Tier::Bronze => "Bronze",
        }
    }
}

/// Share of the board ranked below the player, in percent.
///
/// `rank` is 0-based, so the top player of a board of `total` scores 100.
pub fn percentile(rank: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(rank) as f64 * 100.0 / total as f64
}

/// A player's standing across boards.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRankInfo {
    pub user_id: i64,
    pub global_rank: u64,
    pub global_score: i64,
    pub daily_rank: Option<u64>,
    pub daily_score: Option<i64>,
    pub weekly_rank: Option<u64>,
    pub weekly_score: Option<i64>,
    pub total_players: u64,
    pub percentile: f64,
    pub tier: Tier,
}

/// Aggregates scores into ranking boards and answers rank queries.
#[derive(Clone)]
pub struct LeaderboardEngine {
    boards: Arc<dyn BoardStore>,
}

impl LeaderboardEngine {
    pub fn new(boards: Arc<dyn BoardStore>) -> Self {
        Self { boards }
    }

    /// Add points to the player on the global, daily, weekly and (if given)
    /// game board, then read back the global and daily ranks.
    pub async fn add_score(
        &self,
        user_id: i64,
        points: u32,
        game_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<ScoreUpdate, EngineError> {
        let member = member_key(user_id);
        let daily = Board::daily(now);
        let mut applied = Vec::with_capacity(4);

        let global_score = self.increment(Board::Global, &member, points, &mut applied).await?;
        let daily_score = self.increment(daily, &member, points, &mut applied).await?;
        self.increment(Board::weekly(now), &member, points, &mut applied)
            .await?;
        if let Some(game_id) = game_id {
            self.increment(Board::Game(game_id), &member, points, &mut applied)
                .await?;
        }

        let (global_rank, daily_rank) = match self.ranks(&member, &daily).await {
            Ok(ranks) => ranks,
            Err(cause) => {
                tracing::error!(
                    member,
                    points,
                    applied = ?applied,
                    error = %cause,
                    "score applied but ranks unavailable"
                );
                return Err(EngineError::RankUnavailable { applied, cause });
            }
        };

        let update = ScoreUpdate {
            user_id,
            points_added: points,
            new_global_score: whole_points(global_score),
            global_rank: global_rank.map_or(0, |r| r + 1),
            new_daily_score: whole_points(daily_score),
            daily_rank: daily_rank.map_or(0, |r| r + 1),
        };

        tracing::info!(
            user_id,
            points,
            game_id = ?game_id,
            global_score = update.new_global_score,
            global_rank = update.global_rank,
            "score added"
        );

        Ok(update)
    }

    async fn ranks(
        &self,
        member: &str,
        daily: &Board,
    ) -> anyhow::Result<(Option<u64>, Option<u64>)> {
        let global = self.boards.reverse_rank(GLOBAL_BOARD, member).await?;
        let daily = self.boards.reverse_rank(&daily.key(), member).await?;
        Ok((global, daily))
    }

    async fn increment(
        &self,
        board: Board,
        member: &str,
        points: u32,
        applied: &mut Vec<Board>,
    ) -> Result<f64, EngineError> {
        match self
            .boards
            .increment(&board.key(), member, f64::from(points))
            .await
        {
            Ok(score) => {
                applied.push(board);
                Ok(score)
            }
            Err(cause) => {
                tracing::error!(
                    member,
                    points,
                    failed = %board,
                    applied = ?applied,
                    error = %cause,
                    "score update stopped partway"
                );
                Err(EngineError::PartialScoreUpdate {
                    applied: applied.clone(),
                    failed: board,
                    cause,
                })
            }
        }
    }

    /// Top `count` rows of a board, best first. Empty if the board does not exist.
    pub async fn get_top(&self, board: Board, count: usize) -> Result<Vec<RankEntry>, EngineError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let rows = self.boards.top(&board.key(), count).await?;

        Ok(rows
            .into_iter()
            .map(|(member, score)| RankEntry {
                member,
                score: whole_points(score),
            })
            .collect())
    }

    /// The player's global, daily and weekly standing.
    ///
    /// Fails with [`EngineError::NotFound`] if the player has never scored.
    pub async fn get_user_rank(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<UserRankInfo, EngineError> {
        let member = member_key(user_id);

        let global_rank = self.boards.reverse_rank(GLOBAL_BOARD, &member).await?;
        let global_score = self.boards.score(GLOBAL_BOARD, &member).await?;
        let (Some(global_rank), Some(global_score)) = (global_rank, global_score) else {
            tracing::debug!(user_id, "user not on the global board");
            return Err(EngineError::NotFound);
        };

        let daily = Board::daily(now).key();
        let daily_rank = self.boards.reverse_rank(&daily, &member).await?;
        let daily_score = self.boards.score(&daily, &member).await?;

        let weekly = Board::weekly(now).key();
        let weekly_rank = self.boards.reverse_rank(&weekly, &member).await?;
        let weekly_score = self.boards.score(&weekly, &member).await?;

        let total_players = self.boards.cardinality(GLOBAL_BOARD).await?;

        Ok(UserRankInfo {
            user_id,
            global_rank: global_rank + 1,
            global_score: whole_points(global_score),
            daily_rank: daily_rank.map(|r| r + 1),
            daily_score: daily_score.map(whole_points),
            weekly_rank: weekly_rank.map(|r| r + 1),
            weekly_score: weekly_score.map(whole_points),
            total_players,
            percentile: percentile(global_rank, total_players),
            tier: Tier::for_rank(global_rank + 1),
        })
    }
}

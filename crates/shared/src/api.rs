//! Shared API request/response types used by the game API server and its clients.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Sign up with a username and email. A login code is mailed on success.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterPayload {
    #[garde(length(min = 3, max = 50), pattern(r"^[a-zA-Z0-9_]+$"))]
    pub username: String,
    #[garde(email)]
    pub email: String,
}

/// Request a fresh login code for an existing account.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RequestCodePayload {
    #[garde(email)]
    pub email: String,
}

/// Returned after a code has been sent.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestCodeResponse {
    /// Seconds until the code expires, if it is still live.
    pub expires_in_secs: Option<u64>,
}

/// Submit the code received via email.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VerifyCodePayload {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 4, max = 10), pattern(r"^[0-9]+$"))]
    pub code: String,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub level: i32,
    pub total_score: i64,
    pub total_matches: i32,
    pub wins: i32,
    pub losses: i32,
    pub email_verified: bool,
}

/// Returned after successful verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserResponse,
}

/// How a match ended for the reporting player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchOutcome {
    Win,
    Loss,
    Draw,
}

impl MatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::Win => "WIN",
            MatchOutcome::Loss => "LOSS",
            MatchOutcome::Draw => "DRAW",
        }
    }
}

/// Returned when a play session starts.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub game_id: i64,
    pub started_at: DateTime<Utc>,
}

/// Report the result of a play session.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct FinishGamePayload {
    #[garde(length(min = 1, max = 64))]
    pub session_id: String,
    #[garde(skip)]
    pub result: MatchOutcome,
    /// Points earned in this match.
    #[garde(range(max = 1_000_000))]
    pub score: u32,
    /// Match length in seconds.
    #[garde(skip)]
    pub duration: u32,
    #[garde(skip)]
    #[serde(default)]
    pub opponent_id: Option<i64>,
}

/// Where a player landed after a score was added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardUpdate {
    pub user_id: i64,
    pub points_added: u32,
    pub new_global_score: i64,
    pub global_rank: u64,
    pub new_daily_score: i64,
    pub daily_rank: u64,
}

/// Returned after a play session is settled.
#[derive(Debug, Serialize, Deserialize)]
pub struct FinishGameResponse {
    pub match_id: i64,
    pub result: MatchOutcome,
    pub score: u32,
    pub earned_score: u32,
    pub new_total_score: i64,
    /// None when the boards did not all take the score.
    pub leaderboard: Option<LeaderboardUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboard_error: Option<LeaderboardFailure>,
}

/// Boards that did and did not take a settled match's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardFailure {
    /// Board keys that hold the new score.
    pub applied: Vec<String>,
    /// Board key whose update failed. None when every board was updated and
    /// only the rank lookup failed.
    pub failed: Option<String>,
}

/// One row of a leaderboard listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    /// None when the board member is not a user key.
    pub user_id: Option<i64>,
    pub username: String,
    pub avatar: Option<String>,
    pub score: i64,
    pub level: i32,
}

/// A player's standing across the global, daily and weekly boards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRankResponse {
    pub user_id: i64,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub global_rank: u64,
    pub global_score: i64,
    pub daily_rank: Option<u64>,
    pub daily_score: Option<i64>,
    pub weekly_rank: Option<u64>,
    pub weekly_score: Option<i64>,
    pub total_players: u64,
    pub percentile: f64,
    pub tier: String,
}

/// Most recent match ids for the caller, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchHistoryResponse {
    pub match_ids: Vec<i64>,
}

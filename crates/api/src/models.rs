use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::api::{MatchOutcome, UserResponse};
use sqlx::FromRow;

/// Account status values stored in `users.status`.
pub mod status {
    pub const ACTIVE: &str = "ACTIVE";
    pub const SUSPENDED: &str = "SUSPENDED";
    pub const BANNED: &str = "BANNED";
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub level: i32,
    pub total_score: i64,
    pub total_matches: i32,
    pub wins: i32,
    pub losses: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_banned(&self) -> bool {
        self.status == status::BANNED
    }

    pub fn is_suspended(&self) -> bool {
        self.status == status::SUSPENDED
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            level: self.level,
            total_score: self.total_score,
            total_matches: self.total_matches,
            wins: self.wins,
            losses: self.losses,
            email_verified: self.email_verified_at.is_some(),
        }
    }
}

/// Display fields for a player, as resolved by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub user_id: i64,
    pub username: String,
    pub avatar: Option<String>,
    pub level: i32,
}

impl From<&User> for PlayerProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            level: user.level,
        }
    }
}

/// Play session stored in Redis for the duration of a match.
///
/// Expires with its active-session marker after 30 minutes; an abandoned
/// session is never reaped explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: String,
    pub user_id: i64,
    pub game_id: i64,
    pub started_at: DateTime<Utc>,
}

/// What the client reports when a session finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub result: MatchOutcome,
    pub score: u32,
    pub duration: u32,
    pub opponent_id: Option<i64>,
}

/// Outcome of settling a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub match_id: i64,
    pub game_id: i64,
    pub result: MatchOutcome,
    pub score: u32,
    pub earned_score: u32,
    pub new_total_score: i64,
}

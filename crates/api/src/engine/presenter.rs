//! Turns raw board rows into display-ready leaderboard entries.

use std::sync::Arc;

use shared::api::{LeaderboardEntry, UserRankResponse};

use super::{
    error::EngineError,
    leaderboard::{RankEntry, UserRankInfo, parse_member},
};
use crate::services::UserDirectory;

/// Display name used when a member cannot be resolved.
pub const UNKNOWN_PLAYER: &str = "Unknown";
const DEFAULT_LEVEL: i32 = 1;

/// Resolves board members to usernames, avatars and levels.
#[derive(Clone)]
pub struct RankPresenter {
    directory: Arc<dyn UserDirectory>,
}

impl RankPresenter {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Number rows 1..n in the order given. Ties keep the board's order.
    pub async fn present(
        &self,
        rows: Vec<RankEntry>,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let mut entries = Vec::with_capacity(rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            let user_id = parse_member(&row.member);
            let profile = match user_id {
                Some(id) => self.directory.lookup(id).await?,
                None => {
                    tracing::warn!(member = %row.member, "unrecognized leaderboard member");
                    None
                }
            };

            entries.push(LeaderboardEntry {
                rank: index as u64 + 1,
                user_id,
                username: profile
                    .as_ref()
                    .map_or_else(|| UNKNOWN_PLAYER.to_string(), |p| p.username.clone()),
                avatar: profile.as_ref().and_then(|p| p.avatar.clone()),
                score: row.score,
                level: profile.as_ref().map_or(DEFAULT_LEVEL, |p| p.level),
            });
        }

        Ok(entries)
    }

    /// Attach the player's username and avatar to their standing.
    pub async fn present_rank(&self, info: UserRankInfo) -> Result<UserRankResponse, EngineError> {
        let profile = self.directory.lookup(info.user_id).await?;

        Ok(UserRankResponse {
            user_id: info.user_id,
            username: profile.as_ref().map(|p| p.username.clone()),
            avatar: profile.and_then(|p| p.avatar),
            global_rank: info.global_rank,
            global_score: info.global_score,
            daily_rank: info.daily_rank,
            daily_score: info.daily_score,
            weekly_rank: info.weekly_rank,
            weekly_score: info.weekly_score,
            total_players: info.total_players,
            percentile: info.percentile,
            tier: info.tier.label().to_string(),
        })
    }
}

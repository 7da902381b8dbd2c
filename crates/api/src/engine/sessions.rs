//! Single active play session per user.
//!
//! `start_session` claims `active-session:user:{id}` with `SET NX EX`, so two
//! concurrent starts for one user cannot both succeed. The session payload is
//! written second with the same TTL. If that write fails the marker is
//! released again before the error is returned.
//!
//! `finish_session` claims the payload with an atomic delete before anything
//! is recorded, so only one of several concurrent finishes settles the match.
//! The marker is released only while it still names the settled session.
//!
//! Abandoned sessions are never reaped: payload and marker expire together
//! after [`SESSION_TTL_SECS`] and the user can start again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::EngineError;
use crate::{
    models::{GameSession, MatchReport, Settlement},
    repos::MatchRecorder,
    stores::{MatchHistoryStore, SessionStore},
};

pub const SESSION_TTL_SECS: u64 = 30 * 60;
/// Recent match ids kept per player.
pub const MATCH_HISTORY_LEN: usize = 50;

/// Enforces one live session per user and settles finished ones.
#[derive(Clone)]
pub struct SessionTracker {
    sessions: Arc<dyn SessionStore>,
    history: Arc<dyn MatchHistoryStore>,
    recorder: Arc<dyn MatchRecorder>,
}

impl SessionTracker {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        history: Arc<dyn MatchHistoryStore>,
        recorder: Arc<dyn MatchRecorder>,
    ) -> Self {
        Self {
            sessions,
            history,
            recorder,
        }
    }

    /// Open a session for `user_id` on `game_id`.
    pub async fn start_session(
        &self,
        user_id: i64,
        game_id: i64,
        now: DateTime<Utc>,
    ) -> Result<GameSession, EngineError> {
        let session = GameSession {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            game_id,
            started_at: now,
        };

        let claimed = self
            .sessions
            .claim_active(user_id, &session.session_id, SESSION_TTL_SECS)
            .await?;
        if !claimed {
            tracing::warn!(user_id, game_id, "session refused: another session is active");
            return Err(EngineError::SessionConflict);
        }

        if let Err(e) = self.sessions.put_session(&session, SESSION_TTL_SECS).await {
            if let Err(release) = self.sessions.release_active(user_id, &session.session_id).await {
                tracing::error!(
                    user_id,
                    error = %release,
                    "failed to release session marker after write failure"
                );
            }
            return Err(e.into());
        }

        tracing::info!(user_id, game_id, session_id = %session.session_id, "session started");

        Ok(session)
    }

    /// Record the match for a live session owned by `user_id` and close it.
    pub async fn finish_session(
        &self,
        session_id: &str,
        user_id: i64,
        report: &MatchReport,
    ) -> Result<Settlement, EngineError> {
        let Some(session) = self.sessions.get_session(session_id).await? else {
            tracing::warn!(user_id, session_id, "finish refused: session not found");
            return Err(EngineError::NotFound);
        };

        if session.user_id != user_id {
            tracing::warn!(
                user_id,
                owner = session.user_id,
                session_id,
                "finish refused: session belongs to another user"
            );
            return Err(EngineError::Ownership);
        }

        let Some(ttl_secs) = self.sessions.claim_session(session_id).await? else {
            tracing::warn!(user_id, session_id, "finish refused: session already settled");
            return Err(EngineError::NotFound);
        };

        let match_id = match self
            .recorder
            .record(user_id, session.game_id, report)
            .await
        {
            Ok(match_id) => match_id,
            Err(e) => {
                if let Err(restore) = self.sessions.put_session(&session, ttl_secs).await {
                    tracing::error!(
                        user_id,
                        session_id,
                        error = %restore,
                        "failed to restore session after recorder failure"
                    );
                }
                return Err(e.into());
            }
        };
        let new_total_score = self
            .recorder
            .update_aggregate_stats(user_id, report.result, report.score)
            .await?;

        self.sessions.release_active(user_id, session_id).await?;

        self.history
            .push(user_id, match_id, MATCH_HISTORY_LEN)
            .await?;

        tracing::info!(
            user_id,
            session_id,
            match_id,
            result = report.result.as_str(),
            score = report.score,
            "session finished"
        );

        Ok(Settlement {
            match_id,
            game_id: session.game_id,
            result: report.result,
            score: report.score,
            earned_score: report.score,
            new_total_score,
        })
    }
}

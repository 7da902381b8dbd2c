use thiserror::Error;

use super::leaderboard::Board;

/// Failures surfaced by the ranking, session and one-time-code engine.
///
/// Everything except `PartialScoreUpdate`, `RankUnavailable` and `Store` is a
/// recoverable, user-facing condition.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("code expired or was never issued")]
    Expired,

    #[error("code does not match")]
    InvalidCode,

    #[error("too many failed attempts")]
    Locked,

    #[error("user already has an active session")]
    SessionConflict,

    #[error("not found")]
    NotFound,

    #[error("session belongs to another user")]
    Ownership,

    /// Boards are incremented one at a time. Boards in `applied` keep the new
    /// score; `failed` and every board after it were not touched.
    #[error("score applied to {applied:?} but failed on {failed}: {cause}")]
    PartialScoreUpdate {
        applied: Vec<Board>,
        failed: Board,
        cause: anyhow::Error,
    },

    /// Every board in `applied` took the points but the ranks could not be
    /// read back.
    #[error("score applied to {applied:?} but rank lookup failed: {cause}")]
    RankUnavailable {
        applied: Vec<Board>,
        cause: anyhow::Error,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

//! Ephemeral ranking and session-state engine.
//!
//! All coordination between concurrent requests happens in Redis through
//! single-key atomic commands (`ZINCRBY`, `INCR`, `SET NX EX`, `EXPIRE`).
//! There is no in-process locking, no multi-key transaction and no internal
//! retry; store failures are returned to the caller as they happen.
//!
//! - **leaderboard** - Score aggregation across global/daily/weekly/game boards
//! - **otp** - One-time login codes with attempt lockout
//! - **sessions** - One live play session per user
//! - **presenter** - Display entries for leaderboard listings

mod error;
pub mod leaderboard;
pub mod otp;
pub mod presenter;
pub mod sessions;

pub use error::EngineError;
pub use leaderboard::{Board, LeaderboardEngine, ScoreUpdate};
pub use otp::OtpGuard;
pub use presenter::RankPresenter;
pub use sessions::SessionTracker;

//! HTTP handlers, one router per resource.

pub mod auth;
pub mod games;
pub mod health;
pub mod leaderboard;

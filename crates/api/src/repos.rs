//! Database repositories (PostgreSQL).
//!
//! This module contains traits and implementations for database access.
//! Each repository is abstracted behind a trait to enable mocking in tests.
//!
//! ## Repositories
//!
//! - **users** - Account CRUD and verification
//! - **matches** - Finished match records and per-player aggregate stats
//! - **status** - Database health checks
//!
//! ## Usage in Handlers
//!
//! Repositories are accessed via `state.repos`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let user = state.repos.users.find_by_email(&email).await?;
//! }
//! ```

mod matches;
mod status;
mod users;

pub use matches::{MatchRecorder, PgMatchRecorder};
pub use status::{PgStatusRepo, StatusRepo};
pub use users::{PgUserRepo, UserRepo};

#[cfg(test)]
pub use matches::MockMatchRecorder;
#[cfg(test)]
pub use status::MockStatusRepo;
#[cfg(test)]
pub use users::MockUserRepo;

use std::sync::Arc;

/// Collection of all database repositories.
#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn UserRepo>,
    pub matches: Arc<dyn MatchRecorder>,
    pub status: Arc<dyn StatusRepo>,
}

//! External service abstractions.
//!
//! This module contains traits and implementations for external services
//! the engine depends on. Each service is abstracted behind a trait to
//! enable mocking in tests.
//!
//! ## Services
//!
//! - **email** - Login codes and welcome messages via Resend (prod) or SMTP (dev)
//! - **directory** - Player display lookup (Redis hash cache over Postgres)
//!
//! ## Usage in Handlers
//!
//! Services are accessed via `AppState`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     state.email.send_welcome(&user.email, &user.username).await?;
//!     let profile = state.directory.lookup(user_id).await?;
//! }
//! ```

mod directory;
mod email;

pub use directory::{CachedUserDirectory, UserDirectory};
pub use email::{EmailSender, NotificationSender};

#[cfg(test)]
pub use directory::MockUserDirectory;
#[cfg(test)]
pub use email::MockNotificationSender;

//! Ephemeral stores (Redis).
//!
//! This module contains traits and implementations for ephemeral data storage.
//! Nothing here is reaped by the service; every key either lives forever
//! (ranking boards) or expires through its Redis TTL.
//!
//! ## Stores
//!
//! - **boards** - Global, daily, weekly and per-game ranking boards
//! - **otp** - Login code digests and failed-attempt counters
//! - **sessions** - Play session payloads and the per-user active-session marker
//! - **profiles** - Cached player display fields (hashes)
//! - **history** - Capped list of recent match ids per player
//! - **tokens** - Bearer tokens issued after login
//!
//! ## Redis Key Patterns
//!
//! ```text
//! leaderboard:global                    → Sorted set, member user:{id}
//! leaderboard:global{YYYYMMDD}          → Daily sorted set
//! leaderboard:weekly:{YYYY}-W{ww}       → Weekly sorted set (ISO week)
//! leaderboard:game:{game_id}            → Per-game sorted set
//! otp:{email}                           → Code digest (TTL = otp_ttl_secs)
//! otp:attempts:{email}                  → Failed attempts (TTL 15 min from the 3rd failure)
//! game-session:{session_id}             → GameSession JSON (TTL 30 min)
//! active-session:user:{user_id}         → Session id holding the marker (TTL 30 min)
//! cache:user:{user_id}                  → Hash of username/avatar/level (TTL 5 min)
//! matches:user:{user_id}                → List of match ids, newest first (max 50)
//! token:{sha256}                        → User id (TTL = token_ttl_secs)
//! ```
//!
//! ## Usage in Handlers
//!
//! Handlers normally go through the engine in `state`, which wraps these stores:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let ids = state.stores.history.recent(user.id).await?;
//! }
//! ```

mod boards;
mod history;
mod otp;
mod profiles;
mod sessions;
mod tokens;

pub use boards::{BoardStore, RedisBoardStore};
pub use history::{MatchHistoryStore, RedisMatchHistoryStore};
pub use otp::{OtpStore, RedisOtpStore};
pub use profiles::{ProfileCache, RedisProfileCache};
pub use sessions::{RedisSessionStore, SessionStore};
pub use tokens::{RedisTokenStore, TokenStore};

#[cfg(test)]
pub(crate) use boards::MockBoardStore;
#[cfg(test)]
pub(crate) use history::{MockMatchHistoryStore, history_key};
#[cfg(test)]
pub(crate) use otp::{MockOtpStore, attempts_key, code_key};
#[cfg(test)]
pub(crate) use profiles::{MockProfileCache, from_fields, profile_key, to_fields};
#[cfg(test)]
pub(crate) use sessions::{MockSessionStore, active_key, session_key};
#[cfg(test)]
pub(crate) use tokens::{MockTokenStore, token_key};

use std::sync::Arc;

/// Collection of all ephemeral stores.
#[derive(Clone)]
pub struct Stores {
    pub boards: Arc<dyn BoardStore>,
    pub otp: Arc<dyn OtpStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileCache>,
    pub history: Arc<dyn MatchHistoryStore>,
    pub tokens: Arc<dyn TokenStore>,
}

impl Stores {
    /// All stores backed by one Redis client.
    pub fn redis(client: redis::Client) -> Self {
        Self {
            boards: Arc::new(RedisBoardStore::new(client.clone())),
            otp: Arc::new(RedisOtpStore::new(client.clone())),
            sessions: Arc::new(RedisSessionStore::new(client.clone())),
            profiles: Arc::new(RedisProfileCache::new(client.clone())),
            history: Arc::new(RedisMatchHistoryStore::new(client.clone())),
            tokens: Arc::new(RedisTokenStore::new(client)),
        }
    }
}

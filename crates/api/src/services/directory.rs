//! Player lookup used when rendering leaderboards.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::{models::PlayerProfile, repos::UserRepo, stores::ProfileCache};

/// How long resolved profiles stay in the Redis cache.
pub const PROFILE_CACHE_TTL_SECS: u64 = 5 * 60;

/// Resolves a user id to display fields.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a player. None if the user does not exist.
    async fn lookup(&self, user_id: i64) -> Result<Option<PlayerProfile>>;
}

/// Read-through directory: Redis hash cache in front of the user repository.
pub struct CachedUserDirectory {
    cache: Arc<dyn ProfileCache>,
    users: Arc<dyn UserRepo>,
}

impl CachedUserDirectory {
    pub fn new(cache: Arc<dyn ProfileCache>, users: Arc<dyn UserRepo>) -> Self {
        Self { cache, users }
    }
}

#[async_trait]
impl UserDirectory for CachedUserDirectory {
    async fn lookup(&self, user_id: i64) -> Result<Option<PlayerProfile>> {
        if let Some(profile) = self.cache.get(user_id).await? {
            tracing::debug!(user_id, "profile cache hit");
            return Ok(Some(profile));
        }

        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };

        let profile = PlayerProfile::from(&user);
        self.cache.put(&profile, PROFILE_CACHE_TTL_SECS).await?;

        Ok(Some(profile))
    }
}

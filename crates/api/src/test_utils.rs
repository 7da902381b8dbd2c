//! Shared test utilities for engine and handler tests.
//!
//! Provides common mock factories, an in-memory stand-in for Redis and a
//! flexible `TestStateBuilder` for constructing `AppState` instances with
//! only the mocks needed for each test.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::{TestStateBuilder, mock_user};
//!
//! let mut user_repo = MockUserRepo::new();
//! user_repo.expect_find_by_id().returning(|id| Ok(Some(mock_user(id, "alice"))));
//!
//! let state = TestStateBuilder::new()
//!     .with_user_repo(user_repo)
//!     .with_redis(Arc::new(MemoryRedis::new()))
//!     .build();
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::models::{GameSession, PlayerProfile, User, status};
use crate::repos::{MockMatchRecorder, MockStatusRepo, MockUserRepo, Repos};
use crate::services::{MockNotificationSender, MockUserDirectory, NotificationSender, UserDirectory};
use crate::state::AppState;
use crate::stores::{
    BoardStore, MatchHistoryStore, MockBoardStore, MockMatchHistoryStore, MockOtpStore,
    MockProfileCache, MockSessionStore, MockTokenStore, OtpStore, ProfileCache, SessionStore,
    Stores, TokenStore, active_key, attempts_key, code_key, from_fields, history_key,
    profile_key, session_key, to_fields, token_key,
};

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        database_url: "postgres://test".to_string(),
        redis_url: "redis://test".to_string(),
        smtp_url: None,
        resend_api_key: None,
        mail_from: "Arcade <noreply@arcade.local>".to_string(),
        env: "test".to_string(),
        sentry_dsn: None,
        otp_length: 6,
        otp_ttl_secs: 300,
        token_ttl_secs: 3600,
    }
}

/// Parses an RFC 3339 timestamp.
pub fn at(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .unwrap()
        .with_timezone(&Utc)
}

/// Creates an active, verified user.
pub fn mock_user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        avatar: Some(format!("{}.png", username)),
        level: 3,
        total_score: 0,
        total_matches: 0,
        wins: 0,
        losses: 0,
        status: status::ACTIVE.to_string(),
        created_at: Utc::now(),
        email_verified_at: Some(Utc::now()),
    }
}

/// Email mock that records every login code it was asked to send.
pub fn code_capturing_sender() -> (MockNotificationSender, Arc<Mutex<Vec<String>>>) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let captured = sent.clone();
    let mut sender = MockNotificationSender::new();
    sender.expect_send_otp().returning(move |_, code, _| {
        captured.lock().unwrap().push(code.to_string());
        Ok(())
    });
    (sender, sent)
}

/// Reads a handler response body as JSON.
pub async fn json_body<T: DeserializeOwned>(response: Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

enum Value {
    Str(String),
    List(Vec<String>),
    Hash(HashMap<String, String>),
    ZSet(HashMap<String, f64>),
}

struct Entry {
    value: Value,
    /// Offset on the keyspace clock at which the key disappears.
    expires_at: Option<Duration>,
}

#[derive(Default)]
struct Keyspace {
    now: Duration,
    entries: HashMap<String, Entry>,
}

impl Keyspace {
    fn purge(&mut self, key: &str) {
        let now = self.now;
        if self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| now >= at)
        {
            self.entries.remove(key);
        }
    }

    fn get(&mut self, key: &str) -> Option<&mut Entry> {
        self.purge(key);
        self.entries.get_mut(key)
    }

    fn set_str(&mut self, key: &str, value: String, ttl_secs: Option<u64>) {
        let expires_at = ttl_secs.map(|s| self.now + Duration::from_secs(s));
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value),
                expires_at,
            },
        );
    }

    fn get_str(&mut self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Some(s.clone()),
            _ => None,
        }
    }

    fn expire(&mut self, key: &str, ttl_secs: u64) {
        let at = self.now + Duration::from_secs(ttl_secs);
        if let Some(entry) = self.get(key) {
            entry.expires_at = Some(at);
        }
    }

    fn del(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn zset(&mut self, key: &str) -> Option<&HashMap<String, f64>> {
        match self.get(key) {
            Some(Entry {
                value: Value::ZSet(members),
                ..
            }) => Some(&*members),
            _ => None,
        }
    }

    /// Members best first: score descending, then member descending.
    fn ranked(&mut self, key: &str) -> Vec<(String, f64)> {
        let mut rows: Vec<(String, f64)> = self
            .zset(key)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        rows
    }
}

/// In-memory keyspace implementing every Redis-backed store.
///
/// Time only moves through [`MemoryRedis::advance`]; a key is gone once the
/// clock reaches its expiry.
#[derive(Default)]
pub struct MemoryRedis {
    inner: Mutex<Keyspace>,
}

impl MemoryRedis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.inner.lock().unwrap().now += by;
    }

    /// String value at `key`, if live.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().get_str(key)
    }

    /// Whole seconds left on `key`. None when missing or without expiry.
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        let mut keyspace = self.inner.lock().unwrap();
        let now = keyspace.now;
        keyspace
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| (at - now).as_secs())
    }

    /// List at `key`, head first.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.inner.lock().unwrap().get(key) {
            Some(Entry {
                value: Value::List(items),
                ..
            }) => items.clone(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl BoardStore for MemoryRedis {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn increment(&self, board: &str, member: &str, delta: f64) -> Result<f64> {
        let mut keyspace = self.inner.lock().unwrap();
        keyspace.purge(board);
        let entry = keyspace.entries.entry(board.to_string()).or_insert(Entry {
            value: Value::ZSet(HashMap::new()),
            expires_at: None,
        });
        let Value::ZSet(members) = &mut entry.value else {
            anyhow::bail!("WRONGTYPE {}", board);
        };
        let score = members.entry(member.to_string()).or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn reverse_rank(&self, board: &str, member: &str) -> Result<Option<u64>> {
        let ranked = self.inner.lock().unwrap().ranked(board);
        Ok(ranked
            .iter()
            .position(|(m, _)| m == member)
            .map(|p| p as u64))
    }

    async fn score(&self, board: &str, member: &str) -> Result<Option<f64>> {
        let mut keyspace = self.inner.lock().unwrap();
        Ok(keyspace.zset(board).and_then(|m| m.get(member).copied()))
    }

    async fn top(&self, board: &str, count: usize) -> Result<Vec<(String, f64)>> {
        let mut ranked = self.inner.lock().unwrap().ranked(board);
        ranked.truncate(count);
        Ok(ranked)
    }

    async fn cardinality(&self, board: &str) -> Result<u64> {
        let mut keyspace = self.inner.lock().unwrap();
        Ok(keyspace.zset(board).map_or(0, |m| m.len() as u64))
    }
}

#[async_trait]
impl OtpStore for MemoryRedis {
    async fn put_code(&self, email: &str, digest: &str, ttl_secs: u64) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .set_str(&code_key(email), digest.to_string(), Some(ttl_secs));
        Ok(())
    }

    async fn get_code(&self, email: &str) -> Result<Option<String>> {
        Ok(self.get_string(&code_key(email)))
    }

    async fn delete_code(&self, email: &str) -> Result<()> {
        self.inner.lock().unwrap().del(&code_key(email));
        Ok(())
    }

    async fn code_ttl(&self, email: &str) -> Result<Option<u64>> {
        Ok(self.ttl_of(&code_key(email)))
    }

    async fn failed_attempts(&self, email: &str) -> Result<u32> {
        let count = self.get_string(&attempts_key(email));
        Ok(count.map(|c| c.parse()).transpose()?.unwrap_or(0))
    }

    async fn record_failure(&self, email: &str) -> Result<u32> {
        let key = attempts_key(email);
        let mut keyspace = self.inner.lock().unwrap();
        let count: u32 = keyspace
            .get_str(&key)
            .map(|c| c.parse())
            .transpose()?
            .unwrap_or(0)
            + 1;
        // INCR keeps an existing expiry.
        match keyspace.get(&key) {
            Some(entry) => entry.value = Value::Str(count.to_string()),
            None => keyspace.set_str(&key, count.to_string(), None),
        }
        Ok(count)
    }

    async fn expire_attempts(&self, email: &str, ttl_secs: u64) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .expire(&attempts_key(email), ttl_secs);
        Ok(())
    }

    async fn reset_attempts(&self, email: &str) -> Result<()> {
        self.inner.lock().unwrap().del(&attempts_key(email));
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryRedis {
    async fn claim_active(&self, user_id: i64, session_id: &str, ttl_secs: u64) -> Result<bool> {
        let key = active_key(user_id);
        let mut keyspace = self.inner.lock().unwrap();
        if keyspace.get(&key).is_some() {
            return Ok(false);
        }
        keyspace.set_str(&key, session_id.to_string(), Some(ttl_secs));
        Ok(true)
    }

    async fn release_active(&self, user_id: i64, session_id: &str) -> Result<()> {
        let key = active_key(user_id);
        let mut keyspace = self.inner.lock().unwrap();
        if keyspace.get_str(&key).as_deref() == Some(session_id) {
            keyspace.del(&key);
        }
        Ok(())
    }

    async fn put_session(&self, session: &GameSession, ttl_secs: u64) -> Result<()> {
        let payload = serde_json::to_string(session)?;
        self.inner.lock().unwrap().set_str(
            &session_key(&session.session_id),
            payload,
            Some(ttl_secs),
        );
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<GameSession>> {
        let payload = self.get_string(&session_key(session_id));
        Ok(payload.map(|p| serde_json::from_str(&p)).transpose()?)
    }

    async fn claim_session(&self, session_id: &str) -> Result<Option<u64>> {
        let key = session_key(session_id);
        let mut keyspace = self.inner.lock().unwrap();
        let now = keyspace.now;
        let Some(expires_at) = keyspace.get(&key).map(|e| e.expires_at) else {
            return Ok(None);
        };
        let ttl = expires_at
            .map_or(0, |at| at.saturating_sub(now).as_secs())
            .max(1);
        keyspace.del(&key);
        Ok(Some(ttl))
    }
}

#[async_trait]
impl ProfileCache for MemoryRedis {
    async fn get(&self, user_id: i64) -> Result<Option<PlayerProfile>> {
        match self.inner.lock().unwrap().get(&profile_key(user_id)) {
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(from_fields(user_id, fields)),
            _ => Ok(None),
        }
    }

    async fn put(&self, profile: &PlayerProfile, ttl_secs: u64) -> Result<()> {
        let fields = to_fields(profile)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let mut keyspace = self.inner.lock().unwrap();
        let expires_at = Some(keyspace.now + Duration::from_secs(ttl_secs));
        keyspace.entries.insert(
            profile_key(profile.user_id),
            Entry {
                value: Value::Hash(fields),
                expires_at,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl MatchHistoryStore for MemoryRedis {
    async fn push(&self, user_id: i64, match_id: i64, keep: usize) -> Result<()> {
        let key = history_key(user_id);
        let mut keyspace = self.inner.lock().unwrap();
        keyspace.purge(&key);
        let entry = keyspace.entries.entry(key.clone()).or_insert(Entry {
            value: Value::List(Vec::new()),
            expires_at: None,
        });
        let Value::List(items) = &mut entry.value else {
            anyhow::bail!("WRONGTYPE {}", key);
        };
        items.insert(0, match_id.to_string());
        items.truncate(keep);
        Ok(())
    }

    async fn recent(&self, user_id: i64) -> Result<Vec<i64>> {
        self.list(&history_key(user_id))
            .iter()
            .map(|id| Ok(id.parse()?))
            .collect()
    }
}

#[async_trait]
impl TokenStore for MemoryRedis {
    async fn issue(&self, token: &str, user_id: i64, ttl_secs: u64) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .set_str(&token_key(token), user_id.to_string(), Some(ttl_secs));
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>> {
        let user_id = self.get_string(&token_key(token));
        Ok(user_id.map(|id| id.parse()).transpose()?)
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        self.inner.lock().unwrap().del(&token_key(token));
        Ok(())
    }
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses default (empty) mocks for any repo/store/service not explicitly set.
/// `with_redis` backs every store that has no explicit mock with one
/// shared in-memory keyspace.
pub struct TestStateBuilder {
    user_repo: Option<MockUserRepo>,
    match_recorder: Option<MockMatchRecorder>,
    status_repo: Option<MockStatusRepo>,
    board_store: Option<MockBoardStore>,
    token_store: Option<MockTokenStore>,
    redis: Option<Arc<MemoryRedis>>,
    email_sender: Option<MockNotificationSender>,
    directory: Option<MockUserDirectory>,
}

impl TestStateBuilder {
    /// Creates a new builder with no mocks configured.
    pub fn new() -> Self {
        Self {
            user_repo: None,
            match_recorder: None,
            status_repo: None,
            board_store: None,
            token_store: None,
            redis: None,
            email_sender: None,
            directory: None,
        }
    }

    pub fn with_user_repo(mut self, repo: MockUserRepo) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn with_match_recorder(mut self, recorder: MockMatchRecorder) -> Self {
        self.match_recorder = Some(recorder);
        self
    }

    pub fn with_status_repo(mut self, repo: MockStatusRepo) -> Self {
        self.status_repo = Some(repo);
        self
    }

    pub fn with_board_store(mut self, store: MockBoardStore) -> Self {
        self.board_store = Some(store);
        self
    }

    pub fn with_token_store(mut self, store: MockTokenStore) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn with_redis(mut self, redis: Arc<MemoryRedis>) -> Self {
        self.redis = Some(redis);
        self
    }

    pub fn with_email_sender(mut self, sender: MockNotificationSender) -> Self {
        self.email_sender = Some(sender);
        self
    }

    pub fn with_directory(mut self, directory: MockUserDirectory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Builds the `AppState` using configured mocks or defaults.
    pub fn build(self) -> AppState {
        let repos = Repos {
            users: Arc::new(self.user_repo.unwrap_or_else(MockUserRepo::new)),
            matches: Arc::new(self.match_recorder.unwrap_or_else(MockMatchRecorder::new)),
            status: Arc::new(self.status_repo.unwrap_or_else(MockStatusRepo::new)),
        };

        let stores = match self.redis {
            Some(redis) => Stores {
                boards: match self.board_store {
                    Some(mock) => Arc::new(mock) as Arc<dyn BoardStore>,
                    None => redis.clone(),
                },
                otp: redis.clone(),
                sessions: redis.clone(),
                profiles: redis.clone(),
                history: redis.clone(),
                tokens: match self.token_store {
                    Some(mock) => Arc::new(mock) as Arc<dyn TokenStore>,
                    None => redis,
                },
            },
            None => Stores {
                boards: Arc::new(self.board_store.unwrap_or_else(MockBoardStore::new)),
                otp: Arc::new(MockOtpStore::new()),
                sessions: Arc::new(MockSessionStore::new()),
                profiles: Arc::new(MockProfileCache::new()),
                history: Arc::new(MockMatchHistoryStore::new()),
                tokens: Arc::new(self.token_store.unwrap_or_else(MockTokenStore::new)),
            },
        };

        let email = Arc::new(self.email_sender.unwrap_or_else(MockNotificationSender::new))
            as Arc<dyn NotificationSender>;
        let directory = Arc::new(self.directory.unwrap_or_else(MockUserDirectory::new))
            as Arc<dyn UserDirectory>;

        AppState::new(test_config(), repos, stores, email, directory)
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

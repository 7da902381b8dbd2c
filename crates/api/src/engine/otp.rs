//! One-time login codes with bounded attempts.
//!
//! Flow:
//! 1. `generate` clears the failed-attempt counter, draws a numeric code,
//!    stores its SHA-256 digest under the email with the configured TTL
//!    (replacing any live code) and mails the plaintext. A code that could
//!    not be sent is deleted again
//! 2. `verify` compares the submitted code against the stored digest
//! 3. Every mismatch increments the counter. When it first reaches 3 the
//!    counter gets a 15 minute TTL; at 5 the email is locked until it expires
//! 4. A match deletes the code and clears the counter
//!
//! Counters below 3 have no TTL and only clear on success or a new code.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use super::error::EngineError;
use crate::{services::NotificationSender, stores::OtpStore};

/// Failed attempts after which verification is refused.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
/// Failed attempt count that starts the lockout window.
pub const LOCKOUT_THRESHOLD: u32 = 3;
pub const LOCKOUT_WINDOW_SECS: u64 = 15 * 60;

fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

fn digest(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Equal-length comparison that does not exit on the first differing byte.
fn digests_match(stored: &str, submitted: &str) -> bool {
    let (a, b) = (stored.as_bytes(), submitted.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Issues and checks one-time login codes.
#[derive(Clone)]
pub struct OtpGuard {
    store: Arc<dyn OtpStore>,
    notifier: Arc<dyn NotificationSender>,
    code_length: usize,
    ttl_secs: u64,
}

impl OtpGuard {
    pub fn new(
        store: Arc<dyn OtpStore>,
        notifier: Arc<dyn NotificationSender>,
        code_length: usize,
        ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            notifier,
            code_length,
            ttl_secs,
        }
    }

    /// Issue a fresh code for `email` and send it.
    pub async fn generate(&self, email: &str, display_name: &str) -> Result<(), EngineError> {
        let code = generate_code(self.code_length);

        self.store.reset_attempts(email).await?;
        self.store
            .put_code(email, &digest(&code), self.ttl_secs)
            .await?;

        if let Err(e) = self.notifier.send_otp(email, &code, display_name).await {
            if let Err(delete) = self.store.delete_code(email).await {
                tracing::error!(
                    email = %email,
                    error = %delete,
                    "failed to withdraw unsent login code"
                );
            }
            return Err(e.into());
        }

        tracing::info!(email = %email, ttl_secs = self.ttl_secs, "login code issued");

        Ok(())
    }

    /// Check a submitted code.
    pub async fn verify(&self, email: &str, code: &str) -> Result<(), EngineError> {
        let Some(stored) = self.store.get_code(email).await? else {
            tracing::warn!(email = %email, "verification failed: no live code");
            return Err(EngineError::Expired);
        };

        let attempts = self.store.failed_attempts(email).await?;
        if attempts >= MAX_FAILED_ATTEMPTS {
            tracing::warn!(email = %email, attempts, "verification refused: locked");
            return Err(EngineError::Locked);
        }

        if !digests_match(&stored, &digest(code)) {
            let attempts = self.store.record_failure(email).await?;
            if attempts == LOCKOUT_THRESHOLD {
                self.store
                    .expire_attempts(email, LOCKOUT_WINDOW_SECS)
                    .await?;
            }
            tracing::warn!(email = %email, attempts, "verification failed: wrong code");
            return Err(EngineError::InvalidCode);
        }

        self.store.delete_code(email).await?;
        self.store.reset_attempts(email).await?;

        tracing::info!(email = %email, "login code verified");

        Ok(())
    }

    /// Seconds until the live code expires, None if there is none.
    pub async fn remaining_seconds(&self, email: &str) -> Result<Option<u64>, EngineError> {
        Ok(self.store.code_ttl(email).await?)
    }
}

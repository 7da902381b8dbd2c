use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    /// SMTP URL for development email (e.g., smtp://localhost:1025)
    #[serde(default)]
    pub smtp_url: Option<String>,
    /// Resend API key for production email
    #[serde(default)]
    pub resend_api_key: Option<String>,
    /// Sender mailbox for outgoing email.
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
    /// Digits per login code.
    #[serde(default = "default_otp_length")]
    pub otp_length: usize,
    /// Login code lifetime.
    #[serde(default = "default_otp_ttl_secs")]
    pub otp_ttl_secs: u64,
    /// Bearer token lifetime.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_mail_from() -> String {
    "Arcade <noreply@arcade.local>".to_string()
}

fn default_otp_length() -> usize {
    6
}

fn default_otp_ttl_secs() -> u64 {
    300
}

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}

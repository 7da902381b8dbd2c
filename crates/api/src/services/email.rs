//! Player notifications over email.
//!
//! Uses Resend in production, SMTP (lettre) in development.
//! This allows local development without a Resend account.

use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
};
use resend_rs::types::CreateEmailBaseOptions;

/// Sends login codes and account notifications to players.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send a one-time login code.
    async fn send_otp(&self, email: &str, code: &str, display_name: &str) -> Result<()>;

    /// Send the welcome message after the first successful login.
    async fn send_welcome(&self, email: &str, display_name: &str) -> Result<()>;
}

/// Rendered plain-text message.
struct Letter {
    subject: &'static str,
    body: String,
}

fn otp_letter(code: &str, display_name: &str) -> Letter {
    Letter {
        subject: "Your login code",
        body: format!(
            "Hi {},\n\nYour login code is: {}\n\nIf you did not request it, ignore this email.",
            display_name, code
        ),
    }
}

fn welcome_letter(display_name: &str) -> Letter {
    Letter {
        subject: "Welcome to the arcade",
        body: format!(
            "Hi {},\n\nYour email is verified. See you on the leaderboard!",
            display_name
        ),
    }
}

/// Email-backed notification sender.
pub enum EmailSender {
    /// SMTP-based sender using lettre (for development)
    Smtp(SmtpSender),
    /// Resend API sender (for production)
    Resend(ResendSender),
}

impl EmailSender {
    /// Create a new email sender based on config.
    /// Uses Resend if api key is provided, otherwise falls back to SMTP.
    pub fn new(
        resend_api_key: Option<String>,
        smtp_url: Option<String>,
        from: String,
    ) -> Result<Self> {
        if let Some(api_key) = resend_api_key.filter(|k| !k.is_empty()) {
            Ok(Self::Resend(ResendSender::new(api_key, from)))
        } else if let Some(url) = smtp_url.filter(|u| !u.is_empty()) {
            Ok(Self::Smtp(SmtpSender::new(url, from)?))
        } else {
            anyhow::bail!("Either RESEND_API_KEY or SMTP_URL must be configured")
        }
    }

    async fn deliver(&self, to: &str, letter: Letter) -> Result<()> {
        match self {
            Self::Resend(sender) => sender.send(to, letter).await,
            Self::Smtp(sender) => sender.send(to, letter),
        }
    }
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send_otp(&self, email: &str, code: &str, display_name: &str) -> Result<()> {
        self.deliver(email, otp_letter(code, display_name)).await
    }

    async fn send_welcome(&self, email: &str, display_name: &str) -> Result<()> {
        self.deliver(email, welcome_letter(display_name)).await
    }
}

/// SMTP sender using lettre.
pub struct SmtpSender {
    transport: SmtpTransport,
    from: String,
}

impl SmtpSender {
    pub fn new(smtp_url: String, from: String) -> Result<Self> {
        let transport = SmtpTransport::from_url(&smtp_url)?.build();

        Ok(Self { transport, from })
    }

    fn send(&self, to: &str, letter: Letter) -> Result<()> {
        let email = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .to(Mailbox::new(None, to.parse()?))
            .subject(letter.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(letter.body)?;

        self.transport.send(&email)?;

        Ok(())
    }
}

/// Resend API sender.
pub struct ResendSender {
    client: resend_rs::Resend,
    from: String,
}

impl ResendSender {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: resend_rs::Resend::new(&api_key),
            from,
        }
    }

    async fn send(&self, to: &str, letter: Letter) -> Result<()> {
        let email = CreateEmailBaseOptions::new(&self.from, [to], letter.subject)
            .with_text(&letter.body);

        self.client.emails.send(email).await?;

        Ok(())
    }
}

//! Where rendered emails go.
//!
//! [`SmtpProvider`] delivers through a mail server; [`LogEmailProvider`] only
//! logs the recipient and subject, which is what development setups without
//! `SMTP_HOST` use.

mod log;
mod smtp;

pub use log::LogEmailProvider;
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::error::NotificationResult;
use async_trait::async_trait;

/// Provider receipt for one email.
#[derive(Debug, Clone)]
pub struct SentEmail {
    /// Server-assigned id, when the provider reports one
    pub message_id: Option<String>,
    pub accepted: bool,
}

impl SentEmail {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            message_id,
            accepted: true,
        }
    }
}

/// A rendered email addressed to a single account holder.
#[derive(Debug, Clone, Default)]
pub struct EmailContent {
    pub to_email: String,
    /// Display name; the bare address is used when empty
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

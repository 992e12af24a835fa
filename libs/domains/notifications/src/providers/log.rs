use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::NotificationResult;
use async_trait::async_trait;

/// Writes emails to the log instead of sending them.
///
/// Used when no SMTP host is configured. The plain text body is logged at
/// debug level so OTPs are visible during local development only.
#[derive(Debug, Clone, Default)]
pub struct LogEmailProvider;

impl LogEmailProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailProvider for LogEmailProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        tracing::info!(to = %email.to_email, subject = %email.subject, "Email not sent (log provider)");
        tracing::debug!(body = %email.text_body, "Email body");

        Ok(SentEmail::delivered(None))
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

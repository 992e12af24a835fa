use std::sync::Arc;

use crate::error::NotificationResult;
use crate::outbox::EmailJob;
use crate::providers::{EmailProvider, SentEmail};
use crate::templates::TemplateEngine;

/// Renders [`EmailJob`]s and hands them to the configured provider.
#[derive(Clone)]
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
    templates: TemplateEngine,
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>) -> NotificationResult<Self> {
        Ok(Self {
            provider,
            templates: TemplateEngine::new()?,
        })
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn send(&self, job: &EmailJob) -> NotificationResult<SentEmail> {
        let name = match job {
            EmailJob::VerifyEmail { name, .. } | EmailJob::PasswordReset { name, .. } => name,
        };
        let content = self
            .templates
            .render_job(job)?
            .into_content(job.recipient(), name);

        self.provider.send(&content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use crate::providers::MockEmailProvider;

    fn job() -> EmailJob {
        EmailJob::PasswordReset {
            to: "grace@example.com".into(),
            name: "Grace".into(),
            otp: "000111".into(),
            expires_in_minutes: 10,
        }
    }

    #[tokio::test]
    async fn test_send_renders_before_handing_off() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .withf(|email| {
                email.to_email == "grace@example.com"
                    && email.to_name == "Grace"
                    && email.text_body.contains("000111")
            })
            .times(1)
            .returning(|_| {
                Ok(SentEmail {
                    message_id: Some("m-1".into()),
                    accepted: true,
                })
            });

        let mailer = Mailer::new(Arc::new(provider)).unwrap();
        let sent = mailer.send(&job()).await.unwrap();
        assert_eq!(sent.message_id.as_deref(), Some("m-1"));
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .returning(|_| Err(NotificationError::ProviderError("down".into())));

        let mailer = Mailer::new(Arc::new(provider)).unwrap();
        assert!(mailer.send(&job()).await.is_err());
    }
}

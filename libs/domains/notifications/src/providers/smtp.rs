//! SMTP email provider implementation using lettre.

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// SMTP configuration.
///
/// Loaded from `SMTP_HOST` (required by [`SmtpConfig::from_env_optional`] to
/// enable SMTP at all), `SMTP_PORT`, `SMTP_FROM_EMAIL`, `SMTP_FROM_NAME`,
/// `SMTP_USERNAME`, `SMTP_PASSWORD` and `SMTP_USE_TLS`.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_email: String,
    pub from_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Whether to use TLS (false for local dev servers like Mailpit).
    pub use_tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from_email", &self.from_email)
            .field("username", &self.username)
            .field("use_tls", &self.use_tls)
            .finish_non_exhaustive()
    }
}

impl SmtpConfig {
    pub fn new(host: String, port: u16, from_email: String, from_name: String) -> Self {
        Self {
            host,
            port,
            from_email,
            from_name,
            username: None,
            password: None,
            use_tls: false,
        }
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    /// `Ok(None)` when `SMTP_HOST` is unset, so callers can fall back to the
    /// log provider.
    pub fn from_env_optional() -> Result<Option<Self>, ConfigError> {
        if env_optional("SMTP_HOST").is_none() {
            return Ok(None);
        }
        Self::from_env().map(Some)
    }
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_optional("SMTP_HOST")
            .ok_or_else(|| ConfigError::MissingEnvVar("SMTP_HOST".to_string()))?;

        Ok(Self {
            host,
            port: env_parse("SMTP_PORT", 1025u16)?,
            from_email: env_or_default("SMTP_FROM_EMAIL", "noreply@localhost"),
            from_name: env_or_default("SMTP_FROM_NAME", "Marketplace"),
            username: env_optional("SMTP_USERNAME"),
            password: env_optional("SMTP_PASSWORD"),
            use_tls: env_parse("SMTP_USE_TLS", false)?,
        })
    }
}

/// SMTP email provider.
#[derive(Clone)]
pub struct SmtpProvider {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    config: Arc<SmtpConfig>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> NotificationResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        })
    }

    fn build_transport(
        config: &SmtpConfig,
    ) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| {
                    NotificationError::ConfigError(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(config.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }

    fn build_message(&self, email: &EmailContent) -> NotificationResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| NotificationError::ProviderError(format!("Invalid from address: {}", e)))?;

        let to: Mailbox = if email.to_name.is_empty() {
            email.to_email.parse()
        } else {
            format!("{} <{}>", email.to_name, email.to_email).parse()
        }
        .map_err(|e| NotificationError::ProviderError(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| NotificationError::ProviderError(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        debug!(
            to = %email.to_email,
            subject = %email.subject,
            host = %self.config.host,
            port = %self.config.port,
            "Sending email via SMTP"
        );

        let message = self.build_message(email)?;

        let response = self.transport.send(message).await.map_err(|e| {
            error!(to = %email.to_email, error = %e, "Failed to send email via SMTP");
            NotificationError::ProviderError(format!("SMTP send failed: {}", e))
        })?;

        let message_id = response.message().next().map(|s| s.to_string());

        info!(to = %email.to_email, message_id = ?message_id, "Email sent via SMTP");

        Ok(SentEmail::delivered(message_id))
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_config_new() {
        let config = SmtpConfig::new(
            "mail.example.com".to_string(),
            587,
            "noreply@example.com".to_string(),
            "Marketplace".to_string(),
        )
        .with_tls(true)
        .with_credentials("user".to_string(), "pass".to_string());

        assert_eq!(config.host, "mail.example.com");
        assert!(config.use_tls);
        assert!(!format!("{:?}", config).contains("pass\""));
    }

    #[test]
    fn test_from_env_optional_without_host() {
        temp_env::with_var_unset("SMTP_HOST", || {
            assert!(SmtpConfig::from_env_optional().unwrap().is_none());
        });
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("SMTP_HOST", Some("localhost")),
                ("SMTP_PORT", None),
                ("SMTP_USE_TLS", None),
                ("SMTP_USERNAME", None),
            ],
            || {
                let config = SmtpConfig::from_env_optional().unwrap().unwrap();
                assert_eq!(config.port, 1025);
                assert!(!config.use_tls);
                assert!(config.username.is_none());
            },
        );
    }

    #[test]
    fn test_from_env_bad_port() {
        temp_env::with_vars(
            [("SMTP_HOST", Some("localhost")), ("SMTP_PORT", Some("smtp"))],
            || {
                assert!(SmtpConfig::from_env().is_err());
            },
        );
    }

    #[tokio::test]
    async fn test_build_message_rejects_bad_recipient() {
        let provider = SmtpProvider::new(SmtpConfig::new(
            "localhost".into(),
            1025,
            "noreply@example.com".into(),
            "Marketplace".into(),
        ))
        .unwrap();

        let email = EmailContent {
            to_email: "not an address".into(),
            subject: "Hi".into(),
            ..Default::default()
        };
        assert!(provider.build_message(&email).is_err());
    }
}

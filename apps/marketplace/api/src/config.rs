use axum_helpers::JwtConfig;
use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_optional, env_parse, server::ServerConfig};
use database::postgres::PostgresConfig;
use domain_notifications::SmtpConfig;
use domain_tasks::DEFAULT_PLATFORM_FEE_BPS;

pub use core_config::Environment;

const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Marketplace business settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketplaceConfig {
    /// Platform fee taken from each approved milestone, in basis points
    pub platform_fee_bps: u32,
    /// Lifetime of verification and password reset codes
    pub otp_ttl_minutes: i64,
    /// Where the payment provider sends the client after checkout
    pub payment_return_url: Option<String>,
    /// Shared secret signing payment webhooks; unset refuses every callback
    pub payment_webhook_secret: Option<String>,
    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

impl FromEnv for MarketplaceConfig {
    /// - PLATFORM_FEE_BPS: defaults to 1000 (10%)
    /// - OTP_TTL_MINUTES: defaults to 10
    /// - PAYMENT_RETURN_URL: optional
    /// - PAYMENT_WEBHOOK_SECRET: optional, the webhook is closed without it
    /// - RUN_MIGRATIONS: defaults to true
    fn from_env() -> Result<Self, ConfigError> {
        let otp_ttl_minutes = env_parse("OTP_TTL_MINUTES", DEFAULT_OTP_TTL_MINUTES)?;
        if otp_ttl_minutes <= 0 {
            return Err(ConfigError::ParseError {
                key: "OTP_TTL_MINUTES".to_string(),
                details: "must be a positive number of minutes".to_string(),
            });
        }

        Ok(Self {
            platform_fee_bps: env_parse("PLATFORM_FEE_BPS", DEFAULT_PLATFORM_FEE_BPS)?,
            otp_ttl_minutes,
            payment_return_url: env_optional("PAYMENT_RETURN_URL"),
            payment_webhook_secret: env_optional("PAYMENT_WEBHOOK_SECRET")
                .filter(|secret| !secret.trim().is_empty()),
            run_migrations: env_parse("RUN_MIGRATIONS", true)?,
        })
    }
}

/// Everything the API binary reads from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub jwt: JwtConfig,
    /// `None` falls back to logging emails instead of sending them
    pub smtp: Option<SmtpConfig>,
    pub marketplace: MarketplaceConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let database = PostgresConfig::from_env()?; // Required
        let jwt = JwtConfig::from_env()?; // Required
        let smtp = SmtpConfig::from_env_optional()?;
        let marketplace = MarketplaceConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            database,
            jwt,
            smtp,
            marketplace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marketplace_defaults() {
        temp_env::with_vars_unset(
            [
                "PLATFORM_FEE_BPS",
                "OTP_TTL_MINUTES",
                "PAYMENT_RETURN_URL",
                "PAYMENT_WEBHOOK_SECRET",
                "RUN_MIGRATIONS",
            ],
            || {
                let config = MarketplaceConfig::from_env().unwrap();
                assert_eq!(config.platform_fee_bps, 1000);
                assert_eq!(config.otp_ttl_minutes, 10);
                assert_eq!(config.payment_return_url, None);
                assert_eq!(config.payment_webhook_secret, None);
                assert!(config.run_migrations);
            },
        );
    }

    #[test]
    fn test_marketplace_overrides() {
        temp_env::with_vars(
            [
                ("PLATFORM_FEE_BPS", Some("250")),
                ("OTP_TTL_MINUTES", Some("15")),
                ("PAYMENT_RETURN_URL", Some("https://app.example.com/paid")),
                ("PAYMENT_WEBHOOK_SECRET", Some("whsec_live")),
                ("RUN_MIGRATIONS", Some("false")),
            ],
            || {
                let config = MarketplaceConfig::from_env().unwrap();
                assert_eq!(config.platform_fee_bps, 250);
                assert_eq!(config.otp_ttl_minutes, 15);
                assert_eq!(
                    config.payment_return_url.as_deref(),
                    Some("https://app.example.com/paid")
                );
                assert_eq!(config.payment_webhook_secret.as_deref(), Some("whsec_live"));
                assert!(!config.run_migrations);
            },
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        temp_env::with_var("PLATFORM_FEE_BPS", Some("ten percent"), || {
            let err = MarketplaceConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PLATFORM_FEE_BPS"));
        });

        temp_env::with_vars(
            [("PLATFORM_FEE_BPS", None), ("OTP_TTL_MINUTES", Some("0"))],
            || {
                let err = MarketplaceConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("OTP_TTL_MINUTES"));
            },
        );
    }

    #[test]
    fn test_blank_webhook_secret_is_unset() {
        temp_env::with_var("PAYMENT_WEBHOOK_SECRET", Some("  "), || {
            let config = MarketplaceConfig::from_env().unwrap();
            assert_eq!(config.payment_webhook_secret, None);
        });
    }

    #[test]
    fn test_full_config_requires_jwt_secret() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/marketplace")),
                ("JWT_SECRET", None),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("JWT_SECRET"));
            },
        );
    }

    #[test]
    fn test_full_config_without_smtp() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/marketplace")),
                ("JWT_SECRET", Some("this-is-a-valid-secret-with-32-chars!")),
                ("SMTP_HOST", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.smtp.is_none());
                assert_eq!(config.app.name, "marketplace_api");
            },
        );
    }
}

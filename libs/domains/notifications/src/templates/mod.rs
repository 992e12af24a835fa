//! Email template rendering engine.
//!
//! Handlebars templates for the transactional emails the marketplace sends.

use crate::error::{NotificationError, NotificationResult};
use crate::outbox::EmailJob;
use crate::providers::EmailContent;
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Rendered email content.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
    pub subject: String,
}

impl RenderedEmail {
    pub fn into_content(self, to_email: &str, to_name: &str) -> EmailContent {
        EmailContent {
            to_email: to_email.to_string(),
            to_name: to_name.to_string(),
            subject: self.subject,
            html_body: self.html,
            text_body: self.text,
        }
    }
}

#[derive(Serialize)]
struct OtpEmailData<'a> {
    name: &'a str,
    otp: &'a str,
    expires_in_minutes: i64,
}

/// Template engine for rendering email templates.
#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        for (name, source) in [
            ("verify_email_html", VERIFY_EMAIL_HTML_TEMPLATE),
            ("verify_email_text", VERIFY_EMAIL_TEXT_TEMPLATE),
            ("password_reset_html", PASSWORD_RESET_HTML_TEMPLATE),
            ("password_reset_text", PASSWORD_RESET_TEXT_TEMPLATE),
        ] {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| {
                    NotificationError::TemplateError(format!("Failed to register {}: {}", name, e))
                })?;
        }

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    fn render<T: Serialize>(&self, template_name: &str, data: &T) -> NotificationResult<String> {
        Ok(self.handlebars.render(template_name, data)?)
    }

    /// Render the email for a queued job.
    pub fn render_job(&self, job: &EmailJob) -> NotificationResult<RenderedEmail> {
        debug!(kind = job.kind(), to = %job.recipient(), "Rendering email");

        let (prefix, subject, name, otp, expires_in_minutes) = match job {
            EmailJob::VerifyEmail {
                name,
                otp,
                expires_in_minutes,
                ..
            } => (
                "verify_email",
                "Verify your email address",
                name,
                otp,
                *expires_in_minutes,
            ),
            EmailJob::PasswordReset {
                name,
                otp,
                expires_in_minutes,
                ..
            } => (
                "password_reset",
                "Reset your password",
                name,
                otp,
                *expires_in_minutes,
            ),
        };

        let data = OtpEmailData {
            name: name.as_str(),
            otp: otp.as_str(),
            expires_in_minutes,
        };

        Ok(RenderedEmail {
            html: self.render(&format!("{}_html", prefix), &data)?,
            text: self.render(&format!("{}_text", prefix), &data)?,
            subject: subject.to_string(),
        })
    }
}

const VERIFY_EMAIL_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5; padding: 40px 20px;">
  <div style="max-width: 560px; margin: 0 auto; background: #ffffff; border-radius: 8px; padding: 40px;">
    <h1 style="color: #18181b; font-size: 22px;">Welcome, {{name}}!</h1>
    <p style="color: #52525b; font-size: 16px;">Use this code to verify your email address:</p>
    <p style="font-size: 32px; font-weight: 700; letter-spacing: 8px; text-align: center; color: #2563eb;">{{otp}}</p>
    <p style="color: #71717a; font-size: 13px;">The code expires in {{expires_in_minutes}} minutes. If you did not create an account you can ignore this email.</p>
  </div>
</body>
</html>"#;

const VERIFY_EMAIL_TEXT_TEMPLATE: &str = r#"Welcome, {{name}}!

Your verification code is: {{otp}}

The code expires in {{expires_in_minutes}} minutes.
If you did not create an account you can ignore this email."#;

const PASSWORD_RESET_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5; padding: 40px 20px;">
  <div style="max-width: 560px; margin: 0 auto; background: #ffffff; border-radius: 8px; padding: 40px;">
    <h1 style="color: #18181b; font-size: 22px;">Password reset</h1>
    <p style="color: #52525b; font-size: 16px;">Hi {{name}}, use this code to reset your password:</p>
    <p style="font-size: 32px; font-weight: 700; letter-spacing: 8px; text-align: center; color: #dc2626;">{{otp}}</p>
    <p style="color: #71717a; font-size: 13px;">The code expires in {{expires_in_minutes}} minutes. If you did not ask for a reset, your password is unchanged.</p>
  </div>
</body>
</html>"#;

const PASSWORD_RESET_TEXT_TEMPLATE: &str = r#"Hi {{name}},

Your password reset code is: {{otp}}

The code expires in {{expires_in_minutes}} minutes.
If you did not ask for a reset, your password is unchanged."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_email_contains_code() {
        let engine = TemplateEngine::new().unwrap();
        let rendered = engine
            .render_job(&EmailJob::VerifyEmail {
                to: "ada@example.com".into(),
                name: "Ada".into(),
                otp: "123456".into(),
                expires_in_minutes: 10,
            })
            .unwrap();

        assert_eq!(rendered.subject, "Verify your email address");
        assert!(rendered.text.contains("123456"));
        assert!(rendered.html.contains("Welcome, Ada!"));
        assert!(rendered.text.contains("10 minutes"));
    }

    #[test]
    fn test_password_reset_subject() {
        let engine = TemplateEngine::new().unwrap();
        let rendered = engine
            .render_job(&EmailJob::PasswordReset {
                to: "ada@example.com".into(),
                name: "Ada".into(),
                otp: "654321".into(),
                expires_in_minutes: 15,
            })
            .unwrap();

        assert_eq!(rendered.subject, "Reset your password");
        assert!(rendered.html.contains("654321"));

        let content = rendered.into_content("ada@example.com", "Ada");
        assert_eq!(content.to_email, "ada@example.com");
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound email for password-reset codes.

use crate::config::{Config, SmtpConfig};
use crate::models::otp::OTP_TTL_MINUTES;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

/// Email delivery error.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email transport is not configured")]
    NotConfigured,

    #[error("Invalid email configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Something that can deliver a reset code to a user.
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), EmailError>;
}

/// Pick the notifier for this deployment.
///
/// Without SMTP settings, or with unusable ones, falls back to
/// `LogNotifier` so the reset flow's development fallback takes over.
pub fn create_notifier(config: &Config) -> Arc<dyn EmailNotifier> {
    match &config.smtp {
        Some(smtp) => match SmtpNotifier::new(smtp) {
            Ok(notifier) => {
                tracing::info!(host = %smtp.host, port = smtp.port, "SMTP email enabled");
                Arc::new(notifier)
            }
            Err(e) => {
                tracing::error!(error = %e, "SMTP configuration rejected, email disabled");
                Arc::new(LogNotifier)
            }
        },
        None => {
            tracing::warn!("SMTP not configured, reset codes will not be emailed");
            Arc::new(LogNotifier)
        }
    }
}

/// Subject and bodies of the reset email.
pub struct ResetEmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl ResetEmailContent {
    pub fn new(code: &str) -> Self {
        Self {
            subject: "Password Reset OTP - StudyHub".to_string(),
            text: format!(
                "Hello,\n\n\
                 You requested to reset your password for your StudyHub account. \
                 Use the code below to proceed:\n\n\
                 {code}\n\n\
                 This code will expire in {OTP_TTL_MINUTES} minutes.\n\n\
                 If you didn't request this password reset, please ignore this email.\n"
            ),
            html: format!(
                r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Password Reset OTP</title></head>
<body style="margin: 0; padding: 40px 20px; font-family: Arial, sans-serif; background-color: #f5f5f5;">
  <div style="max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 8px; padding: 40px 30px;">
    <h1 style="margin: 0 0 24px 0; font-size: 28px;">Password Reset</h1>
    <p>You requested to reset your password for your StudyHub account. Use the code below to proceed:</p>
    <div style="border: 2px solid #000000; border-radius: 8px; padding: 20px; margin: 30px 0; text-align: center;">
      <span style="font-size: 32px; font-weight: 700; letter-spacing: 8px; font-family: 'Courier New', monospace;">{code}</span>
    </div>
    <p style="color: #666666; font-size: 14px;">This code will expire in <strong>{OTP_TTL_MINUTES} minutes</strong>.</p>
    <p style="color: #666666; font-size: 14px;">If you didn't request this password reset, please ignore this email.</p>
  </div>
</body>
</html>"#
            ),
        }
    }
}

/// SMTP delivery via lettre.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        // SMTP_SECURE selects implicit TLS; otherwise STARTTLS is required.
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| EmailError::InvalidConfig(format!("SMTP relay error: {}", e)))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: format!("\"{}\" <{}>", config.from_name, config.username),
        })
    }
}

#[async_trait]
impl EmailNotifier for SmtpNotifier {
    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let content = ResetEmailContent::new(code);

        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| EmailError::InvalidConfig(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| EmailError::SendFailed(format!("Invalid to address: {}", e)))?)
            .subject(content.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(content.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(content.html),
                    ),
            )
            .map_err(|e| EmailError::SendFailed(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        tracing::info!(to, "Password reset email sent");
        Ok(())
    }
}

/// Stand-in when no transport is configured. Never delivers.
pub struct LogNotifier;

#[async_trait]
impl EmailNotifier for LogNotifier {
    async fn send_reset_code(&self, to: &str, _code: &str) -> Result<(), EmailError> {
        tracing::debug!(to, "No email transport, reset code not sent");
        Err(EmailError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_includes_code_and_expiry() {
        let content = ResetEmailContent::new("042917");
        assert_eq!(content.subject, "Password Reset OTP - StudyHub");
        assert!(content.text.contains("042917"));
        assert!(content.text.contains("10 minutes"));
        assert!(content.html.contains("042917"));
    }

    #[tokio::test]
    async fn test_log_notifier_always_fails() {
        let result = LogNotifier.send_reset_code("a@example.com", "123456").await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[test]
    fn test_smtp_notifier_builds() {
        let notifier = SmtpNotifier::new(&SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            secure: false,
            username: "mailer@studyhub.test".to_string(),
            password: "pass".to_string(),
            from_name: "StudyHub".to_string(),
        })
        .unwrap();
        assert_eq!(notifier.from, "\"StudyHub\" <mailer@studyhub.test>");
    }

    #[test]
    fn test_create_notifier_without_smtp() {
        // Falls back to the log notifier; nothing to assert beyond not panicking.
        let _ = create_notifier(&Config::test_default());
    }
}

//! # Email Integration
//!
//! Email sending for authentication flows.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::auth::errors::{AuthError, AuthResult};

/// Email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server host
    pub smtp_host: String,

    /// SMTP server port
    pub smtp_port: u16,

    /// SMTP username
    pub smtp_user: String,

    /// SMTP password (should come from secrets)
    pub smtp_password: String,

    /// From email address
    pub from_email: String,

    /// From name
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@devcamper.io".to_string(),
            from_name: "DevCamper".to_string(),
        }
    }
}

/// Email template types
#[derive(Debug, Clone, PartialEq)]
pub enum EmailTemplate {
    /// Password reset link
    PasswordReset { reset_url: String, user_email: String },
}

impl EmailTemplate {
    /// Recipient, subject and body
    pub fn render(&self) -> (String, String, String) {
        match self {
            EmailTemplate::PasswordReset {
                reset_url,
                user_email,
            } => {
                let subject = "Password reset token".to_string();
                let body = format!(
                    "You are receiving this email because you (or someone else) has \
                    requested the reset of a password. Please make a PUT request to:\n\n\
                    {}\n\n\
                    This link will expire in 10 minutes.",
                    reset_url
                );
                (user_email.clone(), subject, body)
            }
        }
    }
}

/// Email sender trait for abstraction
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email
    async fn send(&self, template: EmailTemplate) -> AuthResult<()>;
}

/// Email sender that records messages instead of delivering them.
///
/// Used when SMTP is not configured and in tests.
#[derive(Debug, Default)]
pub struct MockEmailSender {
    sent: Mutex<Vec<EmailTemplate>>,
    fail: bool,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Get number of sent emails
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }

    /// Most recently sent email
    pub fn last_sent(&self) -> Option<EmailTemplate> {
        self.sent.lock().ok().and_then(|sent| sent.last().cloned())
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, template: EmailTemplate) -> AuthResult<()> {
        if self.fail {
            return Err(AuthError::EmailError("delivery disabled".to_string()));
        }

        let (to, subject, _) = template.render();
        info!(%to, %subject, "email captured (SMTP not configured)");

        self.sent
            .lock()
            .map_err(|_| AuthError::EmailError("mailbox poisoned".to_string()))?
            .push(template);
        Ok(())
    }
}

/// SMTP email sender
pub struct SmtpEmailSender {
    config: EmailConfig,
}

impl SmtpEmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, template: EmailTemplate) -> AuthResult<()> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let (to, subject, body) = template.render();

        let email = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| AuthError::EmailError(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AuthError::EmailError(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AuthError::EmailError(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_user.is_empty() {
            // No authentication (local development SMTP servers)
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_user.clone(),
                self.config.smtp_password.clone(),
            );

            let builder = if self.config.smtp_port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            }
            .map_err(|e| AuthError::EmailError(format!("SMTP relay error: {}", e)))?;

            builder
                .credentials(creds)
                .port(self.config.smtp_port)
                .build()
        };

        mailer.send(email).await.map_err(|e| {
            warn!(error = %e, "SMTP delivery failed");
            AuthError::EmailError(format!("Failed to send email: {}", e))
        })?;

        Ok(())
    }
}

/// Create an email sender based on config
pub fn create_email_sender(config: Option<EmailConfig>) -> Arc<dyn EmailSender> {
    match config {
        Some(cfg) => Arc::new(SmtpEmailSender::new(cfg)),
        None => Arc::new(MockEmailSender::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_email() -> EmailTemplate {
        EmailTemplate::PasswordReset {
            reset_url: "http://localhost:5000/api/v1/auth/resetpassword/abc123".to_string(),
            user_email: "user@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_email_sender() {
        let sender = MockEmailSender::new();

        sender.send(reset_email()).await.unwrap();

        assert_eq!(sender.sent_count(), 1);
        assert_eq!(sender.last_sent(), Some(reset_email()));
    }

    #[tokio::test]
    async fn test_failing_sender() {
        let sender = MockEmailSender::failing();

        let result = sender.send(reset_email()).await;
        assert!(matches!(result, Err(AuthError::EmailError(_))));
        assert_eq!(sender.sent_count(), 0);
    }

    #[test]
    fn test_template_rendering() {
        let (to, subject, body) = reset_email().render();

        assert_eq!(to, "user@example.com");
        assert_eq!(subject, "Password reset token");
        assert!(body.contains("/api/v1/auth/resetpassword/abc123"));
    }
}

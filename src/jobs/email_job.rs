//! Email background job.
//!
//! Emails are queued as [`EmailJob`]s and delivered over SMTP by the
//! `jobs work` worker (`SMTP_HOST`, `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS`,
//! `SMTP_FROM`, `SMTP_TLS`). Without `SMTP_HOST` the worker logs each email
//! instead of sending it.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::AppError;

/// Email job payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Sender override (defaults to SMTP_FROM)
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailJob {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

/// SMTP settings read by the worker
struct EmailConfig {
    smtp_host: Option<String>,
    smtp_port: u16,
    smtp_user: Option<String>,
    smtp_pass: Option<String>,
    smtp_from: String,
    smtp_tls: bool,
}

impl EmailConfig {
    fn from_env() -> Self {
        Self {
            smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_user: env::var("SMTP_USER").ok().filter(|u| !u.is_empty()),
            smtp_pass: env::var("SMTP_PASS").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| crate::config::DEFAULT_FROM_EMAIL.to_string()),
            smtp_tls: env::var("SMTP_TLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    fn transport(&self, host: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>, AppError> {
        let builder = if self.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::Email(format!("SMTP relay {}: {}", host, e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let mut builder = builder.port(self.smtp_port);
        if let Some(user) = &self.smtp_user {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                self.smtp_pass.clone().unwrap_or_default(),
            ));
        }
        Ok(builder.build())
    }
}

/// Plain-text message for `job`, sent from `from`.
fn build_message(job: &EmailJob, from: &str) -> Result<Message, AppError> {
    let sender: Mailbox = from
        .parse()
        .map_err(|e| AppError::Email(format!("invalid sender {}: {}", from, e)))?;
    let recipient: Mailbox = job
        .to
        .parse()
        .map_err(|e| AppError::Email(format!("invalid recipient {}: {}", job.to, e)))?;

    Message::builder()
        .from(sender)
        .to(recipient)
        .subject(job.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(job.body.clone())
        .map_err(|e| AppError::Email(e.to_string()))
}

/// Email job handler - processes email sending jobs.
///
/// A delivery error is returned to apalis so the job is retried.
pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    let config = EmailConfig::from_env();
    let from = job.from.as_deref().unwrap_or(&config.smtp_from);

    tracing::info!(
        to = %job.to,
        from = %from,
        subject = %job.subject,
        "Processing email job"
    );

    let Some(host) = &config.smtp_host else {
        tracing::warn!("SMTP not configured - logging email instead of sending");
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            from,
            job.to,
            job.subject,
            job.body
        );
        return Ok(());
    };

    let message = build_message(&job, from)?;
    let mailer = config.transport(host)?;
    match mailer.send(message).await {
        Ok(response) => {
            tracing::info!(to = %job.to, code = %response.code(), "Email delivered");
            Ok(())
        }
        Err(e) => {
            tracing::error!(to = %job.to, host = %host, error = %e, "SMTP delivery failed");
            Err(AppError::Email(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_job_builder() {
        let job = EmailJob::new("a@example.com", "Hello", "Body").with_from("b@example.com");
        assert_eq!(job.to, "a@example.com");
        assert_eq!(job.from.as_deref(), Some("b@example.com"));
    }

    #[test]
    fn test_email_job_payload_defaults_sender() {
        let job: EmailJob =
            serde_json::from_str(r#"{"to":"a@example.com","subject":"s","body":"b"}"#).unwrap();
        assert!(job.from.is_none());
    }

    #[test]
    fn test_message_is_built_from_job() {
        let job = EmailJob::new("applicant@example.com", "Approved", "Welcome aboard");
        let message = build_message(&job, "noreply@example.com").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: applicant@example.com"));
        assert!(raw.contains("Subject: Approved"));
        assert!(raw.contains("Welcome aboard"));
    }

    #[test]
    fn test_bad_recipient_is_a_delivery_error() {
        let job = EmailJob::new("not an address", "Approved", "Body");
        let err = build_message(&job, "noreply@example.com").unwrap_err();
        assert!(matches!(err, AppError::Email(_)));
        assert_eq!(err.code(), "NET002");
    }

    #[tokio::test]
    async fn test_handler_logs_without_smtp() {
        let job = EmailJob::new("a@example.com", "Hello", "Body");
        assert!(email_job_handler(job).await.is_ok());
    }
}

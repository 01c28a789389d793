//! Outgoing mail seam.
//!
//! Services hand finished [`EmailJob`]s to a [`Mailer`]. The server uses
//! [`QueueMailer`], which pushes them onto the apalis PostgreSQL queue;
//! [`LogMailer`] only logs and serves when the queue is unavailable.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use async_trait::async_trait;

use super::EmailJob;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: EmailJob) -> AppResult<()>;
}

/// Enqueues emails for the background worker
pub struct QueueMailer {
    storage: PostgresStorage<EmailJob>,
}

impl QueueMailer {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Mailer for QueueMailer {
    async fn send(&self, email: EmailJob) -> AppResult<()> {
        let mut storage = self.storage.clone();
        let to = email.to.clone();
        storage
            .push(email)
            .await
            .map_err(|e| AppError::internal(format!("Failed to enqueue email: {}", e)))?;

        tracing::debug!(to = %to, "Email queued");
        Ok(())
    }
}

/// Logs emails without delivering them
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: EmailJob) -> AppResult<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email not queued (no job storage)"
        );
        Ok(())
    }
}

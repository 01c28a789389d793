//! Registration documents: applicant uploads and super-owner review.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::super_owner_service::ensure_flag;
use crate::domain::document::{content_type_for, storage_key, validate_upload};
use crate::domain::{
    Document, DocumentStatus, DocumentType, ReviewDecision, SuperOwner, SuperOwnerPermission,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{DocumentStorage, UnitOfWork};

/// A file received from the applicant
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub document_type: DocumentType,
    pub filename: String,
    pub description: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DocumentReview {
    pub decision: ReviewDecision,
    #[validate(length(max = 2000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

/// File contents ready to stream back
#[derive(Debug, Clone)]
pub struct DocumentDownload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Attach a document to the open request identified by `token`
    async fn upload(&self, token: &str, upload: DocumentUpload) -> AppResult<Document>;

    async fn list_for_request(&self, actor: &SuperOwner, request_id: Uuid)
        -> AppResult<Vec<Document>>;

    async fn review(
        &self,
        actor: &SuperOwner,
        document_id: Uuid,
        review: DocumentReview,
    ) -> AppResult<Document>;

    async fn download(&self, actor: &SuperOwner, document_id: Uuid) -> AppResult<DocumentDownload>;
}

/// Last path component of a client-supplied filename
fn base_name(filename: &str) -> String {
    Path::new(filename.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

pub struct DocumentManager<U: UnitOfWork> {
    uow: Arc<U>,
    storage: Arc<dyn DocumentStorage>,
}

impl<U: UnitOfWork> DocumentManager<U> {
    pub fn new(uow: Arc<U>, storage: Arc<dyn DocumentStorage>) -> Self {
        Self { uow, storage }
    }

    async fn load(&self, id: Uuid) -> AppResult<Document> {
        self.uow.documents().find_by_id(id).await?.ok_or_not_found()
    }
}

#[async_trait]
impl<U: UnitOfWork> DocumentService for DocumentManager<U> {
    async fn upload(&self, token: &str, upload: DocumentUpload) -> AppResult<Document> {
        let request = self
            .uow
            .registrations()
            .find_by_token(token)
            .await?
            .ok_or_not_found()?;

        let now = Utc::now();
        if !request.accepts_documents(now) {
            return Err(AppError::business(
                "This registration request no longer accepts documents",
            ));
        }

        let filename = base_name(&upload.filename);
        let ext = validate_upload(&filename, upload.bytes.len())?;
        let id = Uuid::new_v4();
        let key = storage_key(request.id, id, &ext);
        let file_size = upload.bytes.len() as i64;

        self.storage.save(&key, upload.bytes).await?;

        let document = Document {
            id,
            request_id: request.id,
            document_type: upload.document_type,
            storage_key: key.clone(),
            original_filename: filename,
            content_type: content_type_for(&ext).to_string(),
            file_size,
            description: upload
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            status: DocumentStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            uploaded_at: now,
        };

        match self.uow.documents().create(document).await {
            Ok(document) => {
                tracing::info!(
                    request_id = %request.id,
                    document_id = %document.id,
                    document_type = %document.document_type,
                    size = document.file_size,
                    "Document uploaded"
                );
                Ok(document)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    async fn list_for_request(
        &self,
        actor: &SuperOwner,
        request_id: Uuid,
    ) -> AppResult<Vec<Document>> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;
        self.uow
            .registrations()
            .find_by_id(request_id)
            .await?
            .ok_or_not_found()?;
        self.uow.documents().list_for_request(request_id).await
    }

    async fn review(
        &self,
        actor: &SuperOwner,
        document_id: Uuid,
        review: DocumentReview,
    ) -> AppResult<Document> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;
        let mut document = self.load(document_id).await?;

        let notes = review
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        document.review(review.decision, actor.user_id, notes, Utc::now());
        let document = self.uow.documents().update(document).await?;

        tracing::info!(
            document_id = %document.id,
            status = %document.status,
            reviewer = %actor.user_id,
            "Document reviewed"
        );
        Ok(document)
    }

    async fn download(&self, actor: &SuperOwner, document_id: Uuid) -> AppResult<DocumentDownload> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;
        let document = self.load(document_id).await?;
        let bytes = self.storage.load(&document.storage_key).await?;

        Ok(DocumentDownload {
            filename: document.original_filename,
            content_type: document.content_type,
            bytes,
        })
    }
}

//! Documents uploaded in support of a registration request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{ALLOWED_DOCUMENT_EXTENSIONS, DOCUMENT_STORAGE_FOLDER, MAX_DOCUMENT_SIZE_BYTES};
use crate::errors::{AppError, AppResult};

string_enum!(
    DocumentType {
        Other => "other",
        BusinessRegistration => "business_registration",
        TaxCertificate => "tax_certificate",
        CacCertificate => "cac_certificate",
        DirectorId => "director_id",
        UtilityBill => "utility_bill",
        BankStatement => "bank_statement",
        IndividualId => "individual_id",
        Passport => "passport",
        License => "license",
    }
);

string_enum!(
    DocumentStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        RequiresRevision => "requires_revision",
    }
);

string_enum!(
    ReviewDecision {
        Approve => "approve",
        Reject => "reject",
        RequireRevision => "require_revision",
    }
);

impl ReviewDecision {
    pub fn status(&self) -> DocumentStatus {
        match self {
            ReviewDecision::Approve => DocumentStatus::Approved,
            ReviewDecision::Reject => DocumentStatus::Rejected,
            ReviewDecision::RequireRevision => DocumentStatus::RequiresRevision,
        }
    }
}

/// Uploaded document metadata; the bytes live in document storage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub request_id: Uuid,
    pub document_type: DocumentType,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub description: Option<String>,
    pub status: DocumentStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf"
    }

    /// Size in megabytes, rounded to two decimals
    pub fn file_size_mb(&self) -> f64 {
        (self.file_size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }

    pub fn review(
        &mut self,
        decision: ReviewDecision,
        reviewer: Uuid,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = decision.status();
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_notes = notes;
    }
}

/// Lowercased extension of a filename, if any
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check size and extension of an upload, returning the extension.
pub fn validate_upload(filename: &str, size: usize) -> AppResult<String> {
    if size == 0 {
        return Err(AppError::validation("Uploaded file is empty"));
    }
    if size > MAX_DOCUMENT_SIZE_BYTES {
        return Err(AppError::FileTooLarge(MAX_DOCUMENT_SIZE_BYTES / (1024 * 1024)));
    }

    let ext = file_extension(filename)
        .ok_or_else(|| AppError::InvalidFileType(String::from("(none)")))?;
    if !ALLOWED_DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::InvalidFileType(ext));
    }
    Ok(ext)
}

/// Relative storage key for a document
pub fn storage_key(request_id: Uuid, document_id: Uuid, ext: &str) -> String {
    format!("{}/{}/{}.{}", DOCUMENT_STORAGE_FOLDER, request_id, document_id, ext)
}

/// Content type derived from the extension
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Scan.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
    }

    #[test]
    fn test_validate_upload() {
        assert_eq!(validate_upload("cac.pdf", 1024).unwrap(), "pdf");
        assert!(matches!(
            validate_upload("virus.exe", 1024),
            Err(AppError::InvalidFileType(_))
        ));
        assert!(matches!(
            validate_upload("big.pdf", MAX_DOCUMENT_SIZE_BYTES + 1),
            Err(AppError::FileTooLarge(10))
        ));
        assert!(validate_upload("empty.pdf", 0).is_err());
        assert!(validate_upload("exact.png", MAX_DOCUMENT_SIZE_BYTES).is_ok());
    }

    #[test]
    fn test_storage_key_layout() {
        let req = Uuid::new_v4();
        let doc = Uuid::new_v4();
        assert_eq!(
            storage_key(req, doc, "png"),
            format!("registration_documents/{}/{}.png", req, doc)
        );
    }

    #[test]
    fn test_derived_properties_and_review() {
        let mut doc = Document {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            document_type: DocumentType::CacCertificate,
            storage_key: "k".to_string(),
            original_filename: "cac.pdf".to_string(),
            content_type: content_type_for("pdf").to_string(),
            file_size: 1_572_864,
            description: None,
            status: DocumentStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            uploaded_at: Utc::now(),
        };
        assert!(doc.is_pdf());
        assert!(!doc.is_image());
        assert_eq!(doc.file_size_mb(), 1.5);

        let reviewer = Uuid::new_v4();
        doc.review(
            ReviewDecision::RequireRevision,
            reviewer,
            Some("Blurry".to_string()),
            Utc::now(),
        );
        assert_eq!(doc.status, DocumentStatus::RequiresRevision);
        assert_eq!(doc.reviewed_by, Some(reviewer));
    }
}

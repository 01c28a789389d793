//! Registration document upload and review tests.

mod common;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use mockall::predicate::eq;
use uuid::Uuid;

use construction_tracker::config::MAX_DOCUMENT_SIZE_BYTES;
use construction_tracker::domain::{
    DelegationLevel, Document, DocumentStatus, DocumentType, RegistrationRequest, RequestStatus, SuperOwner,
};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::{
    MockDocumentRepository, MockRegistrationRepository,
};
use construction_tracker::infra::MockDocumentStorage;
use construction_tracker::services::{DocumentManager, DocumentService, DocumentUpload};

use common::{company_request, expired_request, primary_owner, TestUnitOfWork};

fn manager(uow: TestUnitOfWork, storage: MockDocumentStorage) -> DocumentManager<TestUnitOfWork> {
    DocumentManager::new(Arc::new(uow), Arc::new(storage))
}

fn request_lookup(request: RegistrationRequest) -> MockRegistrationRepository {
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_token()
        .withf(|token| token == "upload-token")
        .returning(move |_| Ok(Some(request.clone())));
    registrations
}

fn pdf(bytes: usize) -> DocumentUpload {
    DocumentUpload {
        document_type: DocumentType::CacCertificate,
        filename: "scans/cac.PDF".to_string(),
        description: Some("  Certificate of incorporation ".to_string()),
        bytes: vec![7; bytes],
    }
}

#[tokio::test]
async fn test_upload_stores_file_then_record() {
    let request = company_request();
    let request_id = request.id;
    let saved_key = Arc::new(Mutex::new(String::new()));

    let mut storage = MockDocumentStorage::new();
    let recorded = saved_key.clone();
    storage
        .expect_save()
        .times(1)
        .withf(|_, bytes| bytes.len() == 2048)
        .returning(move |key, _| {
            *recorded.lock().unwrap() = key.to_string();
            Ok(())
        });
    let mut documents = MockDocumentRepository::new();
    documents.expect_create().times(1).returning(Ok);

    let document = manager(
        TestUnitOfWork::default()
            .with_registrations(request_lookup(request))
            .with_documents(documents),
        storage,
    )
    .upload("upload-token", pdf(2048))
    .await
    .expect("document stored");

    assert_eq!(document.request_id, request_id);
    assert_eq!(document.original_filename, "cac.PDF");
    assert_eq!(document.content_type, "application/pdf");
    assert_eq!(document.status, DocumentStatus::Pending);
    assert_eq!(
        document.description.as_deref(),
        Some("Certificate of incorporation")
    );
    assert_eq!(document.storage_key, *saved_key.lock().unwrap());
    assert!(document.storage_key.ends_with(&format!("{}.pdf", document.id)));
}

#[tokio::test]
async fn test_upload_to_closed_request_is_refused() {
    let mut request = company_request();
    request.status = RequestStatus::Rejected;
    let mut storage = MockDocumentStorage::new();
    storage.expect_save().never();

    let result = manager(
        TestUnitOfWork::default().with_registrations(request_lookup(request)),
        storage,
    )
    .upload("upload-token", pdf(100))
    .await;

    assert!(matches!(result, Err(AppError::Business(_))));
}

#[tokio::test]
async fn test_upload_to_expired_request_is_refused() {
    let mut storage = MockDocumentStorage::new();
    storage.expect_save().never();

    let result = manager(
        TestUnitOfWork::default().with_registrations(request_lookup(expired_request())),
        storage,
    )
    .upload("upload-token", pdf(100))
    .await;

    assert!(matches!(result, Err(AppError::Business(_))));
}

#[tokio::test]
async fn test_upload_with_unknown_token_is_not_found() {
    let mut registrations = MockRegistrationRepository::new();
    registrations.expect_find_by_token().returning(|_| Ok(None));

    let result = manager(
        TestUnitOfWork::default().with_registrations(registrations),
        MockDocumentStorage::new(),
    )
    .upload("missing", pdf(100))
    .await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_storage() {
    let mut storage = MockDocumentStorage::new();
    storage.expect_save().never();

    let result = manager(
        TestUnitOfWork::default().with_registrations(request_lookup(company_request())),
        storage,
    )
    .upload("upload-token", pdf(MAX_DOCUMENT_SIZE_BYTES + 1))
    .await;

    assert!(matches!(result, Err(AppError::FileTooLarge(10))));
}

#[tokio::test]
async fn test_disallowed_extension_is_rejected() {
    let mut storage = MockDocumentStorage::new();
    storage.expect_save().never();
    let upload = DocumentUpload {
        filename: "setup.exe".to_string(),
        ..pdf(100)
    };

    let result = manager(
        TestUnitOfWork::default().with_registrations(request_lookup(company_request())),
        storage,
    )
    .upload("upload-token", upload)
    .await;

    assert!(matches!(result, Err(AppError::InvalidFileType(ext)) if ext == "exe"));
}

#[tokio::test]
async fn test_failed_record_write_removes_the_stored_file() {
    let saved_key = Arc::new(Mutex::new(String::new()));

    let mut storage = MockDocumentStorage::new();
    let recorded = saved_key.clone();
    storage.expect_save().times(1).returning(move |key, _| {
        *recorded.lock().unwrap() = key.to_string();
        Ok(())
    });
    let expected = saved_key.clone();
    storage
        .expect_remove()
        .times(1)
        .withf(move |key| *expected.lock().unwrap() == key)
        .returning(|_| Ok(()));
    let mut documents = MockDocumentRepository::new();
    documents
        .expect_create()
        .returning(|_| Err(AppError::internal("insert failed")));

    let result = manager(
        TestUnitOfWork::default()
            .with_registrations(request_lookup(company_request()))
            .with_documents(documents),
        storage,
    )
    .upload("upload-token", pdf(512))
    .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn test_download_needs_account_activation_flag() {
    let analyst = SuperOwner::delegated(
        Uuid::new_v4(),
        DelegationLevel::ReadOnly,
        None,
        Vec::new(),
        None,
    );
    let mut documents = MockDocumentRepository::new();
    documents.expect_find_by_id().never();

    let result = manager(
        TestUnitOfWork::default().with_documents(documents),
        MockDocumentStorage::new(),
    )
    .download(&analyst, Uuid::new_v4())
    .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_download_streams_stored_bytes() {
    let request = company_request();
    let document_id = Uuid::new_v4();
    let document = Document {
        id: document_id,
        request_id: request.id,
        document_type: DocumentType::TaxCertificate,
        storage_key: format!("registration_documents/{}/{}.pdf", request.id, document_id),
        original_filename: "tcc-2024.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        file_size: 8,
        description: None,
        status: DocumentStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        review_notes: None,
        uploaded_at: Utc::now(),
    };
    let key = document.storage_key.clone();

    let mut documents = MockDocumentRepository::new();
    documents
        .expect_find_by_id()
        .with(eq(document_id))
        .returning(move |_| Ok(Some(document.clone())));
    let mut storage = MockDocumentStorage::new();
    storage
        .expect_load()
        .withf(move |k| k == key)
        .returning(|_| Ok(b"%PDF-1.7".to_vec()));

    let download = manager(TestUnitOfWork::default().with_documents(documents), storage)
        .download(&primary_owner(), document_id)
        .await
        .expect("download");

    assert_eq!(download.filename, "tcc-2024.pdf");
    assert_eq!(download.content_type, "application/pdf");
    assert_eq!(download.bytes, b"%PDF-1.7".to_vec());
}

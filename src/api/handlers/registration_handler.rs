//! Public registration handlers: submission, status page and document upload.

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::client_ip;
use crate::api::AppState;
use crate::config::MAX_DOCUMENT_SIZE_BYTES;
use crate::domain::{ClientMeta, Document, DocumentType, RegistrationRequest};
use crate::errors::{AppError, AppResult};
use crate::services::{
    CompanyRegistrationForm, DocumentUpload, IndividualRegistrationForm, RegistrationDetail,
    SubmissionReceipt,
};

/// Multipart overhead allowed on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create public registration routes
pub fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/register/company", post(submit_company))
        .route("/register/individual", post(submit_individual))
        .route("/registration/status/:token", get(status))
        .route(
            "/registration/status/:token/documents",
            post(upload_document)
                .layer(DefaultBodyLimit::max(MAX_DOCUMENT_SIZE_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/registration/status/:token/resubmit", post(resubmit))
}

fn client_meta(headers: &HeaderMap, peer: Option<ConnectInfo<SocketAddr>>) -> ClientMeta {
    ClientMeta {
        ip_address: client_ip(headers, peer.map(|info| info.0)),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string),
    }
}

/// Submit a company registration request
#[utoipa::path(
    post,
    path = "/register/company",
    tag = "Registration",
    request_body = CompanyRegistrationForm,
    responses(
        (status = 201, description = "Request received", body = SubmissionReceipt),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username, email or open request already exists")
    )
)]
pub async fn submit_company(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ValidatedJson(form): ValidatedJson<CompanyRegistrationForm>,
) -> AppResult<(StatusCode, Json<SubmissionReceipt>)> {
    let receipt = state
        .services
        .registrations()
        .submit_company(form, client_meta(&headers, peer))
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Submit an individual registration request
#[utoipa::path(
    post,
    path = "/register/individual",
    tag = "Registration",
    request_body = IndividualRegistrationForm,
    responses(
        (status = 201, description = "Request received", body = SubmissionReceipt),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username, email or open request already exists")
    )
)]
pub async fn submit_individual(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ValidatedJson(form): ValidatedJson<IndividualRegistrationForm>,
) -> AppResult<(StatusCode, Json<SubmissionReceipt>)> {
    let receipt = state
        .services
        .registrations()
        .submit_individual(form, client_meta(&headers, peer))
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Status of a request, looked up by its activation token
#[utoipa::path(
    get,
    path = "/registration/status/{token}",
    tag = "Registration",
    params(("token" = String, Path, description = "Activation token")),
    responses(
        (status = 200, description = "Request status", body = RegistrationDetail),
        (status = 404, description = "Unknown token")
    )
)]
pub async fn status(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<RegistrationDetail>> {
    Ok(Json(state.services.registrations().status(&token).await?))
}

/// Upload a supporting document.
///
/// Multipart fields: `document_type`, optional `description`, and `file`.
#[utoipa::path(
    post,
    path = "/registration/status/{token}/documents",
    tag = "Registration",
    params(("token" = String, Path, description = "Activation token")),
    request_body(content = String, content_type = "multipart/form-data", description = "document_type, description, file"),
    responses(
        (status = 201, description = "Document stored", body = Document),
        (status = 400, description = "Invalid file type or size, or request closed"),
        (status = 404, description = "Unknown token")
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    Path(token): Path<String>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Document>)> {
    let mut document_type = None;
    let mut description = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name().unwrap_or_default() {
            "document_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                document_type = Some(value.trim().parse::<DocumentType>()?);
            }
            "description" => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?,
                );
            }
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let document_type =
        document_type.ok_or_else(|| AppError::validation("document_type is required"))?;
    let (filename, bytes) = file.ok_or_else(|| AppError::validation("file is required"))?;

    let document = state
        .services
        .documents()
        .upload(
            &token,
            DocumentUpload {
                document_type,
                filename,
                description,
                bytes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// Send a request back for review after supplying documents
#[utoipa::path(
    post,
    path = "/registration/status/{token}/resubmit",
    tag = "Registration",
    params(("token" = String, Path, description = "Activation token")),
    responses(
        (status = 200, description = "Request resubmitted", body = RegistrationRequest),
        (status = 409, description = "Request is not awaiting documents")
    )
)]
pub async fn resubmit(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<RegistrationRequest>> {
    Ok(Json(state.services.registrations().resubmit(&token).await?))
}

//! Registration request and document persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::base::{fetch_page, iequals, search_any, update_error};
use super::entities::document::{self, Entity as DocumentEntity};
use super::entities::registration_request::{self, Entity as RequestEntity};
use crate::domain::{Document, RegistrationRequest, RequestStatus};
use crate::errors::{AppError, AppResult};
use crate::types::{search_term, PaginationParams, RequestFilter};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

fn open_statuses() -> Vec<&'static str> {
    RequestStatus::OPEN.iter().map(|s| s.as_str()).collect()
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn create(&self, request: RegistrationRequest) -> AppResult<RegistrationRequest>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RegistrationRequest>>;

    async fn find_by_token(&self, token: &str) -> AppResult<Option<RegistrationRequest>>;

    async fn update(&self, request: RegistrationRequest) -> AppResult<RegistrationRequest>;

    /// Page of requests, newest first
    async fn list(
        &self,
        filter: &RequestFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<RegistrationRequest>, u64)>;

    /// Whether an undecided request exists for this email
    async fn has_open_request(&self, email: &str) -> AppResult<bool>;

    /// Undecided requests whose deadline is before `now`
    async fn list_expired_open(&self, now: DateTime<Utc>) -> AppResult<Vec<RegistrationRequest>>;

    async fn count_by_status(&self) -> AppResult<Vec<(RequestStatus, u64)>>;

    /// Every request, newest first
    async fn all(&self) -> AppResult<Vec<RegistrationRequest>>;
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: Document) -> AppResult<Document>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>>;

    async fn list_for_request(&self, request_id: Uuid) -> AppResult<Vec<Document>>;

    async fn update(&self, document: Document) -> AppResult<Document>;
}

pub struct RegistrationStore {
    db: DatabaseConnection,
}

impl RegistrationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RegistrationRepository for RegistrationStore {
    async fn create(&self, request: RegistrationRequest) -> AppResult<RegistrationRequest> {
        let model = registration_request::ActiveModel::from(&request)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(RegistrationRequest::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RegistrationRequest>> {
        let result = RequestEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(RegistrationRequest::from))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<RegistrationRequest>> {
        let result = RequestEntity::find()
            .filter(registration_request::Column::ActivationToken.eq(token))
            .one(&self.db)
            .await?;
        Ok(result.map(RegistrationRequest::from))
    }

    async fn update(&self, request: RegistrationRequest) -> AppResult<RegistrationRequest> {
        let model = registration_request::ActiveModel::from(&request)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(RegistrationRequest::from(model))
    }

    async fn list(
        &self,
        filter: &RequestFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<RegistrationRequest>, u64)> {
        let mut query =
            RequestEntity::find().order_by_desc(registration_request::Column::CreatedAt);
        if let Some(status) = filter.status {
            query = query.filter(registration_request::Column::Status.eq(status.as_str()));
        }
        if let Some(request_type) = filter.request_type {
            query =
                query.filter(registration_request::Column::RequestType.eq(request_type.as_str()));
        }
        if let Some(term) = search_term(&filter.search) {
            query = query.filter(search_any(
                vec![
                    registration_request::Column::Email,
                    registration_request::Column::Username,
                    registration_request::Column::FirstName,
                    registration_request::Column::LastName,
                    registration_request::Column::CompanyName,
                ],
                term,
            ));
        }

        let (models, total) = fetch_page(&self.db, query, params).await?;
        Ok((models.into_iter().map(RegistrationRequest::from).collect(), total))
    }

    async fn has_open_request(&self, email: &str) -> AppResult<bool> {
        let count = RequestEntity::find()
            .filter(iequals(registration_request::Column::Email, email))
            .filter(registration_request::Column::Status.is_in(open_statuses()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn list_expired_open(&self, now: DateTime<Utc>) -> AppResult<Vec<RegistrationRequest>> {
        let models = RequestEntity::find()
            .filter(registration_request::Column::Status.is_in(open_statuses()))
            .filter(registration_request::Column::ExpiresAt.lt(now))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(RegistrationRequest::from).collect())
    }

    async fn count_by_status(&self) -> AppResult<Vec<(RequestStatus, u64)>> {
        let rows: Vec<(String, i64)> = RequestEntity::find()
            .select_only()
            .column(registration_request::Column::Status)
            .column_as(Expr::cust("COUNT(*)"), "count")
            .group_by(registration_request::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| (RequestStatus::from_db(&status), count.max(0) as u64))
            .collect())
    }

    async fn all(&self) -> AppResult<Vec<RegistrationRequest>> {
        let models = RequestEntity::find()
            .order_by_desc(registration_request::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(RegistrationRequest::from).collect())
    }
}

pub struct DocumentStore {
    db: DatabaseConnection,
}

impl DocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for DocumentStore {
    async fn create(&self, document: Document) -> AppResult<Document> {
        let model = document::ActiveModel::from(&document)
            .insert(&self.db)
            .await?;
        Ok(Document::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        let result = DocumentEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Document::from))
    }

    async fn list_for_request(&self, request_id: Uuid) -> AppResult<Vec<Document>> {
        let models = DocumentEntity::find()
            .filter(document::Column::RequestId.eq(request_id))
            .order_by_asc(document::Column::UploadedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Document::from).collect())
    }

    async fn update(&self, document: Document) -> AppResult<Document> {
        let model = document::ActiveModel::from(&document)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Document::from(model))
    }
}

//! Registration document entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Document, DocumentStatus, DocumentType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registration_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub document_type: String,
    pub storage_key: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub description: Option<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub review_notes: Option<String>,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Document {
    fn from(model: Model) -> Self {
        Document {
            id: model.id,
            request_id: model.request_id,
            document_type: DocumentType::from_db(&model.document_type),
            storage_key: model.storage_key,
            original_filename: model.original_filename,
            content_type: model.content_type,
            file_size: model.file_size,
            description: model.description,
            status: DocumentStatus::from_db(&model.status),
            reviewed_by: model.reviewed_by,
            reviewed_at: model.reviewed_at,
            review_notes: model.review_notes,
            uploaded_at: model.uploaded_at,
        }
    }
}

impl From<&Document> for ActiveModel {
    fn from(doc: &Document) -> Self {
        ActiveModel {
            id: Set(doc.id),
            request_id: Set(doc.request_id),
            document_type: Set(doc.document_type.to_string()),
            storage_key: Set(doc.storage_key.clone()),
            original_filename: Set(doc.original_filename.clone()),
            content_type: Set(doc.content_type.clone()),
            file_size: Set(doc.file_size),
            description: Set(doc.description.clone()),
            status: Set(doc.status.to_string()),
            reviewed_by: Set(doc.reviewed_by),
            reviewed_at: Set(doc.reviewed_at),
            review_notes: Set(doc.review_notes.clone()),
            uploaded_at: Set(doc.uploaded_at),
        }
    }
}

//! Account activation request entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{RegistrationRequest, RequestStatus, RequestType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registration_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_type: String,
    pub status: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
    pub company_address: Option<String>,
    pub company_registration_number: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub rejection_reason: Option<String>,
    #[sea_orm(unique)]
    pub activation_token: String,
    pub expires_at: DateTimeUtc,
    pub metadata: Json,
    pub provisioned_user_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RegistrationRequest {
    fn from(model: Model) -> Self {
        RegistrationRequest {
            id: model.id,
            request_type: RequestType::from_db(&model.request_type),
            status: RequestStatus::from_db(&model.status),
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            company_name: model.company_name,
            company_description: model.company_description,
            company_website: model.company_website,
            company_address: model.company_address,
            company_registration_number: model.company_registration_number,
            reviewed_by: model.reviewed_by,
            reviewed_at: model.reviewed_at,
            rejection_reason: model.rejection_reason,
            activation_token: model.activation_token,
            expires_at: model.expires_at,
            metadata: serde_json::from_value(model.metadata).unwrap_or_default(),
            provisioned_user_id: model.provisioned_user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&RegistrationRequest> for ActiveModel {
    fn from(request: &RegistrationRequest) -> Self {
        ActiveModel {
            id: Set(request.id),
            request_type: Set(request.request_type.to_string()),
            status: Set(request.status.to_string()),
            email: Set(request.email.clone()),
            username: Set(request.username.clone()),
            first_name: Set(request.first_name.clone()),
            last_name: Set(request.last_name.clone()),
            phone: Set(request.phone.clone()),
            company_name: Set(request.company_name.clone()),
            company_description: Set(request.company_description.clone()),
            company_website: Set(request.company_website.clone()),
            company_address: Set(request.company_address.clone()),
            company_registration_number: Set(request.company_registration_number.clone()),
            reviewed_by: Set(request.reviewed_by),
            reviewed_at: Set(request.reviewed_at),
            rejection_reason: Set(request.rejection_reason.clone()),
            activation_token: Set(request.activation_token.clone()),
            expires_at: Set(request.expires_at),
            metadata: Set(serde_json::json!(request.metadata)),
            provisioned_user_id: Set(request.provisioned_user_id),
            created_at: Set(request.created_at),
            updated_at: Set(request.updated_at),
        }
    }
}

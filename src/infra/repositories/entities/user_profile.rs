//! User profile entity (1:1 with users).

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{AccountType, UserProfile};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub account_type: String,
    pub is_verified: bool,
    pub is_account_active: bool,
    pub activated_by: Option<Uuid>,
    pub activated_at: Option<DateTimeUtc>,
    pub last_company_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UserProfile {
    fn from(model: Model) -> Self {
        UserProfile {
            user_id: model.user_id,
            phone: model.phone,
            address: model.address,
            account_type: AccountType::from_db(&model.account_type),
            is_verified: model.is_verified,
            is_account_active: model.is_account_active,
            activated_by: model.activated_by,
            activated_at: model.activated_at,
            last_company_id: model.last_company_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&UserProfile> for ActiveModel {
    fn from(profile: &UserProfile) -> Self {
        ActiveModel {
            user_id: Set(profile.user_id),
            phone: Set(profile.phone.clone()),
            address: Set(profile.address.clone()),
            account_type: Set(profile.account_type.to_string()),
            is_verified: Set(profile.is_verified),
            is_account_active: Set(profile.is_account_active),
            activated_by: Set(profile.activated_by),
            activated_at: Set(profile.activated_at),
            last_company_id: Set(profile.last_company_id),
            created_at: Set(profile.created_at),
            updated_at: Set(profile.updated_at),
        }
    }
}

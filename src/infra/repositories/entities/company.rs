//! Company entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Company, SubscriptionType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub registration_number: Option<String>,
    pub subscription_type: String,
    pub subscription_end_date: Option<DateTimeUtc>,
    pub is_active: bool,
    pub timezone: String,
    pub currency: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Company {
    fn from(model: Model) -> Self {
        Company {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            email: model.email,
            phone: model.phone,
            address: model.address,
            website: model.website,
            registration_number: model.registration_number,
            subscription_type: SubscriptionType::from_db(&model.subscription_type),
            subscription_end_date: model.subscription_end_date,
            is_active: model.is_active,
            timezone: model.timezone,
            currency: model.currency,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Company> for ActiveModel {
    fn from(company: &Company) -> Self {
        ActiveModel {
            id: Set(company.id),
            name: Set(company.name.clone()),
            slug: Set(company.slug.clone()),
            description: Set(company.description.clone()),
            email: Set(company.email.clone()),
            phone: Set(company.phone.clone()),
            address: Set(company.address.clone()),
            website: Set(company.website.clone()),
            registration_number: Set(company.registration_number.clone()),
            subscription_type: Set(company.subscription_type.to_string()),
            subscription_end_date: Set(company.subscription_end_date),
            is_active: Set(company.is_active),
            timezone: Set(company.timezone.clone()),
            currency: Set(company.currency.clone()),
            created_at: Set(company.created_at),
            updated_at: Set(company.updated_at),
        }
    }
}

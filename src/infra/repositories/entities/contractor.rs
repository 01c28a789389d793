//! Contractor entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Contractor, ContractorType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contractors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub contractor_type: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub license_number: Option<String>,
    pub hourly_rate: Option<i64>,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Contractor {
    fn from(model: Model) -> Self {
        Contractor {
            id: model.id,
            company_id: model.company_id,
            name: model.name,
            contractor_type: ContractorType::from_db(&model.contractor_type),
            contact_person: model.contact_person,
            email: model.email,
            phone: model.phone,
            address: model.address,
            license_number: model.license_number,
            hourly_rate: model.hourly_rate,
            rating: model.rating,
            is_active: model.is_active,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Contractor> for ActiveModel {
    fn from(contractor: &Contractor) -> Self {
        ActiveModel {
            id: Set(contractor.id),
            company_id: Set(contractor.company_id),
            name: Set(contractor.name.clone()),
            contractor_type: Set(contractor.contractor_type.to_string()),
            contact_person: Set(contractor.contact_person.clone()),
            email: Set(contractor.email.clone()),
            phone: Set(contractor.phone.clone()),
            address: Set(contractor.address.clone()),
            license_number: Set(contractor.license_number.clone()),
            hourly_rate: Set(contractor.hourly_rate),
            rating: Set(contractor.rating),
            is_active: Set(contractor.is_active),
            notes: Set(contractor.notes.clone()),
            created_at: Set(contractor.created_at),
            updated_at: Set(contractor.updated_at),
        }
    }
}

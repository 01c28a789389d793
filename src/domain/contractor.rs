//! Contractors working for a company.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

string_enum!(
    ContractorType {
        General => "general",
        Electrical => "electrical",
        Plumbing => "plumbing",
        Hvac => "hvac",
        Roofing => "roofing",
        Flooring => "flooring",
        Painting => "painting",
        Landscaping => "landscaping",
        Other => "other",
    }
);

/// Contractor domain entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Contractor {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub contractor_type: ContractorType,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub license_number: Option<String>,
    /// Minor currency units per hour
    pub hourly_rate: Option<i64>,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contractor {
    pub fn new(company_id: Uuid, input: ContractorInput) -> Self {
        let now = Utc::now();
        let mut contractor = Self {
            id: Uuid::new_v4(),
            company_id,
            name: String::new(),
            contractor_type: ContractorType::default(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            license_number: None,
            hourly_rate: None,
            rating: None,
            is_active: true,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        contractor.apply(input);
        contractor
    }

    pub fn apply(&mut self, input: ContractorInput) {
        self.name = input.name.trim().to_string();
        if let Some(contractor_type) = input.contractor_type {
            self.contractor_type = contractor_type;
        }
        self.contact_person = input.contact_person;
        self.email = input.email;
        self.phone = input.phone;
        self.address = input.address;
        self.license_number = input.license_number;
        self.hourly_rate = input.hourly_rate;
        self.rating = input.rating;
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.notes = input.notes;
        self.updated_at = Utc::now();
    }
}

/// Create/update payload for contractors
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ContractorInput {
    #[validate(length(min = 1, max = 200, message = "Contractor name is required (max 200 characters)"))]
    #[schema(example = "Bright Sparks Electrical")]
    pub name: String,
    pub contractor_type: Option<ContractorType>,
    pub contact_person: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub license_number: Option<String>,
    #[validate(range(min = 0i64, max = 1_000_000_000_000_000i64, message = "Hourly rate is out of range"))]
    pub hourly_rate: Option<i64>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(rating: Option<f64>) -> ContractorInput {
        ContractorInput {
            name: "  Ace Plumbing ".to_string(),
            contractor_type: Some(ContractorType::Plumbing),
            contact_person: None,
            email: Some("ace@example.com".to_string()),
            phone: None,
            address: None,
            license_number: None,
            hourly_rate: Some(2_500),
            rating,
            is_active: None,
            notes: None,
        }
    }

    #[test]
    fn test_new_contractor() {
        let contractor = Contractor::new(Uuid::new_v4(), input(Some(4.5)));
        assert_eq!(contractor.name, "Ace Plumbing");
        assert_eq!(contractor.contractor_type, ContractorType::Plumbing);
        assert!(contractor.is_active);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(input(Some(5.0)).validate().is_ok());
        assert!(input(Some(0.0)).validate().is_ok());
        assert!(input(Some(5.1)).validate().is_err());
        assert!(input(Some(-1.0)).validate().is_err());
        assert!(input(None).validate().is_ok());
    }

    #[test]
    fn test_update_keeps_active_flag_unless_given() {
        let mut contractor = Contractor::new(Uuid::new_v4(), input(None));
        let mut change = input(None);
        change.is_active = Some(false);
        contractor.apply(change);
        assert!(!contractor.is_active);

        contractor.apply(input(None));
        assert!(!contractor.is_active);
    }
}

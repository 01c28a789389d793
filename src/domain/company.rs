//! Company (tenant) entity.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{DEFAULT_CURRENCY, DEFAULT_TIMEZONE};

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

string_enum!(
    SubscriptionType {
        Trial => "trial",
        Basic => "basic",
        Professional => "professional",
        Enterprise => "enterprise",
    }
);

/// Company domain entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub registration_number: Option<String>,
    pub subscription_type: SubscriptionType,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub timezone: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn is_subscription_active(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.subscription_end_date.map_or(true, |end| now <= end)
    }
}

/// Data needed to insert a company
#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub registration_number: Option<String>,
}

impl NewCompany {
    /// A new active company on a trial subscription.
    pub fn into_company(self) -> Company {
        let now = Utc::now();
        Company {
            id: Uuid::new_v4(),
            name: self.name,
            slug: self.slug,
            description: self.description,
            email: self.email,
            phone: self.phone,
            address: self.address,
            website: self.website,
            registration_number: self.registration_number,
            subscription_type: SubscriptionType::Trial,
            subscription_end_date: None,
            is_active: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-company counters for the super-owner console
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompanyStats {
    pub member_count: u64,
    pub active_member_count: u64,
    pub project_count: u64,
    pub active_project_count: u64,
    pub total_budget: i64,
    pub total_expenses: i64,
}

/// Lowercase, hyphen-separated slug for a company name.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "company".to_string()
    } else {
        slug.to_string()
    }
}

/// First of `base`, `base-1`, `base-2`, ... not present in `taken`.
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }

    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.iter().any(|s| s == candidate))
        .unwrap_or_else(|| format!("{}-{}", base, Uuid::new_v4().simple()))
}

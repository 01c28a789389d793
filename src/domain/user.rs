//! User domain entity and profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

string_enum!(
    /// How an account participates in the system
    AccountType {
        Individual => "individual",
        CompanyAdmin => "company_admin",
        CompanyMember => "company_member",
    }
);

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Activation flag gating login
    pub is_active: bool,
    pub is_staff: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// First and last name, falling back to the username
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Whether this account may authenticate
    pub fn can_authenticate(&self, profile: Option<&UserProfile>) -> bool {
        self.is_active && profile.map_or(true, |p| p.is_account_active)
    }
}

/// Data needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
}

impl NewUser {
    /// Materialize the user with a fresh id and timestamps.
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            is_active: self.is_active,
            is_staff: self.is_staff,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-user profile (1:1 with user)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub account_type: AccountType,
    pub is_verified: bool,
    pub is_account_active: bool,
    pub activated_by: Option<Uuid>,
    pub activated_at: Option<DateTime<Utc>>,
    /// Company the user last worked in
    pub last_company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh, not yet activated profile
    pub fn new(user_id: Uuid, account_type: AccountType) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            phone: None,
            address: None,
            account_type,
            is_verified: false,
            is_account_active: false,
            activated_by: None,
            activated_at: None,
            last_company_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the profile active and verified.
    pub fn activate(&mut self, activated_by: Option<Uuid>, now: DateTime<Utc>) {
        self.is_account_active = true;
        self.is_verified = true;
        self.activated_by = activated_by;
        self.activated_at = Some(now);
        self.updated_at = now;
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.
//! Each module converts its `Model` into the matching domain type and
//! builds an `ActiveModel` from a domain value.

pub mod company;
pub mod contractor;
pub mod document;
pub mod expense;
pub mod expense_category;
pub mod membership;
pub mod notification;
pub mod notification_preference;
pub mod project;
pub mod project_contractor;
pub mod registration_request;
pub mod role;
pub mod super_owner;
pub mod user;
pub mod user_profile;

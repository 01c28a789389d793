//! HTTP request handlers.

pub mod auth_handler;
pub mod company_handler;
pub mod contractor_handler;
pub mod dashboard_handler;
pub mod expense_handler;
pub mod health_handler;
pub mod notification_handler;
pub mod project_handler;
pub mod registration_handler;
pub mod super_owner_handler;

pub use auth_handler::{auth_routes, session_routes};
pub use company_handler::company_routes;
pub use contractor_handler::contractor_routes;
pub use dashboard_handler::dashboard_routes;
pub use expense_handler::expense_routes;
pub use health_handler::{health_routes, status_routes};
pub use notification_handler::notification_routes;
pub use project_handler::project_routes;
pub use registration_handler::registration_routes;
pub use super_owner_handler::super_owner_routes;

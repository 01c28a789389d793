//! Construction Tracker - multi-tenant construction project and expense API
//!
//! Companies and individuals apply through a public registration workflow;
//! super owners review the requests and their documents, and an approval
//! provisions the account, the company, its default roles and the owner's
//! membership in one transaction. Members then track projects, expenses
//! and contractors inside their current company.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core business entities and rules
//! - **services**: Application use cases
//! - **infra**: Database, Redis, document storage and provisioning
//! - **jobs**: Email queue worker and the mailer seam
//! - **api**: HTTP handlers, middleware, extractors and routes
//! - **types**: Shared types (pagination, filters, responses)
//! - **errors**: Categorized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Bootstrap the primary super owner
//! cargo run -- create-super-owner --username root --email root@example.com --password '...'
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Company, Password, RegistrationRequest, TenantContext, User};
pub use errors::{AppError, AppResult};
pub use infra::Cache;

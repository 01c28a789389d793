//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server
//! - `migrate` - Database migrations
//! - `jobs` - Background job management
//! - `create-super-owner` - Bootstrap the primary super owner
//! - `registrations` - Registration request maintenance

pub mod args;

pub use args::{Cli, Commands};

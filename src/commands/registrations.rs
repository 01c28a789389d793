//! Registrations command - request maintenance.
//!
//! ```bash
//! # Expire open requests past their expiry date (run from cron)
//! cargo run -- registrations expire
//! ```

use crate::cli::args::{RegistrationsAction, RegistrationsArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::services::ServiceContainer;

/// Execute the registrations command
pub async fn execute(args: RegistrationsArgs, config: Config) -> AppResult<()> {
    match args.action {
        RegistrationsAction::Expire => {
            let services = super::connect_services(&config).await?;
            let expired = services.registrations().expire_stale().await?;
            tracing::info!(expired, "Stale registration requests expired");
            println!("Expired {} registration request(s).", expired);
        }
    }
    Ok(())
}

//! Create-super-owner command - bootstraps the primary owner.

use crate::cli::args::CreateSuperOwnerArgs;
use crate::config::Config;
use crate::errors::AppResult;
use crate::services::ServiceContainer;

/// Execute the create-super-owner command
pub async fn execute(args: CreateSuperOwnerArgs, config: Config) -> AppResult<()> {
    let services = super::connect_services(&config).await?;

    let owner = services
        .super_owner()
        .bootstrap_primary_owner(args.username.clone(), args.email, args.password)
        .await?;

    println!(
        "Primary owner ready: {} (super owner id {})",
        args.username, owner.id
    );
    Ok(())
}

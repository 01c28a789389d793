//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Construction Tracker - multi-tenant project and expense tracking API
#[derive(Parser, Debug)]
#[command(name = "construction-tracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "CONFIG_PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage background jobs
    Jobs(JobsArgs),

    /// Create or promote the primary super owner
    CreateSuperOwner(CreateSuperOwnerArgs),

    /// Registration request maintenance
    Registrations(RegistrationsArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "SERVER_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "SERVER_PORT")]
    pub port: u16,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the jobs command
#[derive(Parser, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub action: JobsAction,
}

/// Job management actions
#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// Start background job worker
    Work,
    /// List pending jobs
    List,
    /// Clear failed jobs
    Clear,
}

/// Arguments for the create-super-owner command
#[derive(Parser, Debug)]
pub struct CreateSuperOwnerArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    /// Password for a newly created account; ignored when the user exists
    #[arg(long, env = "SUPER_OWNER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the registrations command
#[derive(Parser, Debug)]
pub struct RegistrationsArgs {
    #[command(subcommand)]
    pub action: RegistrationsAction,
}

#[derive(Subcommand, Debug)]
pub enum RegistrationsAction {
    /// Mark open requests past their expiry date as expired
    Expire,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_super_owner() {
        let cli = Cli::try_parse_from([
            "construction-tracker",
            "create-super-owner",
            "--username",
            "root",
            "--email",
            "root@example.com",
            "--password",
            "Sup3rSecret!",
        ])
        .expect("valid arguments");

        match cli.command {
            Commands::CreateSuperOwner(args) => {
                assert_eq!(args.username, "root");
                assert_eq!(args.email, "root@example.com");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_registrations_expire() {
        let cli = Cli::try_parse_from(["construction-tracker", "registrations", "expire"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::Registrations(RegistrationsArgs {
                action: RegistrationsAction::Expire
            })
        ));
    }

    #[test]
    fn test_migrate_requires_action() {
        assert!(Cli::try_parse_from(["construction-tracker", "migrate"]).is_err());
    }
}

//! Jobs command - email queue management.
//!
//! - `work`: deliver queued notification emails
//! - `list`: show queue counts by status
//! - `clear`: remove failed jobs
//!
//! ```bash
//! cargo run -- jobs work
//! cargo run -- jobs list
//! cargo run -- jobs clear
//! ```

use apalis::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use super::connect_queue;
use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::jobs::email_job_handler;

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Run the email worker until Ctrl+C
async fn run_worker(config: &Config) -> AppResult<()> {
    tracing::info!("Connecting to email queue...");
    let email_storage = connect_queue(config, 5).await?;

    let worker = WorkerBuilder::new("email-worker")
        .backend(email_storage)
        .build_fn(email_job_handler);

    tracing::info!("Email worker started. Press Ctrl+C to stop.");

    tokio::select! {
        result = Monitor::new().register(worker).run() => {
            if let Err(e) = result {
                tracing::error!("Worker error: {}", e);
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Email worker stopped.");
    Ok(())
}

async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    let db = Database::connect_without_migrations(config)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;
    Ok(db.get_connection())
}

/// Whether the apalis schema has been created by a worker
async fn queue_initialized(db: &DatabaseConnection) -> AppResult<bool> {
    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await?;

    Ok(row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false))
}

async fn list_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;

    if !queue_initialized(&db).await? {
        println!("Email queue not initialized. Run 'jobs work' or 'serve' first.");
        return Ok(());
    }

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs GROUP BY status ORDER BY status",
        ))
        .await?;

    println!("\n=== Email Queue ===");
    if rows.is_empty() {
        println!("(empty)");
    }
    for row in rows {
        if let (Ok(status), Ok(count)) = (
            row.try_get::<String>("", "status"),
            row.try_get::<i64>("", "count"),
        ) {
            println!("{:<10}{}", status, count);
        }
    }
    println!("===================\n");

    Ok(())
}

async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;

    if !queue_initialized(&db).await? {
        println!("Email queue not initialized. Nothing to clear.");
        return Ok(());
    }

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await?;

    println!("Cleared {} failed job(s).", result.rows_affected());
    Ok(())
}

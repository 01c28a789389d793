//! Database migrations.
//!
//! Each migration is a separate module following SeaORM conventions.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts;
mod m20240101_000002_create_companies;
mod m20240101_000003_create_registrations;
mod m20240101_000004_create_projects;
mod m20240101_000005_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts::Migration),
            Box::new(m20240101_000002_create_companies::Migration),
            Box::new(m20240101_000003_create_registrations::Migration),
            Box::new(m20240101_000004_create_projects::Migration),
            Box::new(m20240101_000005_create_notifications::Migration),
        ]
    }
}

//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. Tenant-scoped tables
//! belong to the application; its migrations create them and call the
//! [`crate::sync::PolicySynchronizer`] hooks inside the same migration
//! transaction.

pub use sea_orm_migration::prelude::*;

mod m20260820_000001_tenants;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260820_000001_tenants::Migration)]
    }
}

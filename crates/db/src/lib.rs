//! Database layer for Rowfence.
//!
//! This crate provides:
//! - The tenant session binder gating every statement behind the
//!   session-scoped tenant setting
//! - The RLS policy synchronizer executed at schema-evolution time
//! - `SeaORM` entity and repository for the tenants table
//! - Database migrations

pub mod binder;
pub mod config;
pub mod entities;
pub mod error;
pub mod metadata;
pub mod migration;
pub mod repositories;
pub mod sync;

pub use binder::{TenantSession, TenantSessionExt};
pub use error::TenancyError;
pub use metadata::MetadataCache;
pub use repositories::TenantRepository;
pub use sync::PolicySynchronizer;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.as_str());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);
    Database::connect(options).await
}

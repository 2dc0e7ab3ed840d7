//! Tenancy error types.

use rowfence_core::tenant::TenantIdError;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the session binder and policy synchronizer.
#[derive(Debug, Error)]
pub enum TenancyError {
    /// Session misconfiguration, surfaced before any statement executes.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A tenant resolution happened with no tenant bound to the session.
    /// Never silently substituted with a default tenant.
    #[error("no tenant bound to the current session")]
    NoTenantBound,

    /// Malformed tenant identity.
    #[error("malformed tenant identity: {0}")]
    InvalidTenant(#[from] TenantIdError),

    /// DDL issuance for the RLS policy bundle failed; the enclosing
    /// schema-evolution transaction must abort.
    #[error("policy sync failed on table {table}: {source}")]
    PolicySync {
        /// Table the bundle was being applied to.
        table: String,
        /// Underlying database error.
        #[source]
        source: DbErr,
    },

    /// Any other database error, left to propagate.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl TenancyError {
    /// Returns the stable error code for operator-facing reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::NoTenantBound => "NO_TENANT_BOUND",
            Self::InvalidTenant(_) => "INVALID_TENANT",
            Self::PolicySync { .. } => "POLICY_SYNC_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

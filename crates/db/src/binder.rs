//! Session tenant binder.
//!
//! Binds an ephemeral "current tenant" identity to a database session and
//! gates every statement behind the session-scoped setting the RLS policies
//! read. Stale session state is the single most dangerous failure mode here:
//! a pooled connection silently retaining a previous caller's binding is a
//! cross-tenant leak. The binder therefore tracks a `bound` flag per session
//! and resets it on every rebind, rollback, and transaction end, forcing
//! re-issuance of the setting before the next statement.
//!
//! # Usage
//!
//! ```ignore
//! use rowfence_db::binder::TenantSessionExt;
//!
//! let mut session = db.tenant_session(&config.tenancy, metadata);
//! session.set_tenant(&tenant);
//!
//! let txn = session.acquire().await?;
//! txn.execute_unprepared("INSERT INTO notes (body) VALUES ('hi')").await?;
//! session.commit().await?;
//! ```

use std::sync::Arc;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, Statement,
    TransactionTrait,
};
use tracing::{debug, trace};

use rowfence_core::policy;
use rowfence_core::tenant::TenantId;

use crate::config::TenancyConfig;
use crate::error::TenancyError;
use crate::metadata::{MetadataCache, TableColumns};

/// Pure per-session binding state, separate from the live connection so the
/// transition rules are testable without a database.
#[derive(Debug, Clone)]
pub struct BinderState {
    current: Option<TenantId>,
    include_public: bool,
    bound: bool,
    limit_set_calls: bool,
}

impl BinderState {
    /// Creates an unbound state.
    #[must_use]
    pub fn new(limit_set_calls: bool) -> Self {
        Self {
            current: None,
            include_public: true,
            bound: false,
            limit_set_calls,
        }
    }

    /// Records the current tenant and forces re-issuance of the setting.
    pub fn set_tenant(&mut self, tenant: TenantId, include_public: bool) {
        self.current = Some(tenant);
        self.include_public = include_public;
        self.bound = false;
    }

    /// Returns the bound tenant, if any.
    #[must_use]
    pub fn current(&self) -> Option<&TenantId> {
        self.current.as_ref()
    }

    /// Whether the live connection currently carries the setting.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether shared/public visibility was requested at bind time.
    ///
    /// Only meaningful for schema-per-tenant deployments; under the RLS
    /// discriminator design visibility is decided by the policy predicate.
    #[must_use]
    pub fn include_public(&self) -> bool {
        self.include_public
    }

    /// Whether the setting must be (re-)issued before the next statement.
    #[must_use]
    pub fn needs_issue(&self) -> bool {
        !(self.limit_set_calls && self.bound)
    }

    /// Marks the setting as issued on the live connection.
    pub fn mark_bound(&mut self) {
        self.bound = true;
    }

    /// Forces re-issuance. Called on rollback, transaction end, and close.
    pub fn reset_bound(&mut self) {
        self.bound = false;
    }
}

/// A tenant-aware database session.
///
/// Owns one connection handle plus the binding state, and is the only path
/// through which tenant-scoped statements should be executed. Statements run
/// inside a transaction that the session opens lazily on first
/// [`acquire`](Self::acquire); `SET LOCAL` scopes the tenant setting to that
/// transaction, so both commit and rollback leave the underlying pooled
/// connection clean for the next checkout.
pub struct TenantSession {
    db: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
    state: BinderState,
    metadata: Arc<MetadataCache>,
}

impl TenantSession {
    /// Creates an unbound session on a connection pool.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        config: &TenancyConfig,
        metadata: Arc<MetadataCache>,
    ) -> Self {
        Self {
            db,
            txn: None,
            state: BinderState::new(config.limit_set_calls),
            metadata,
        }
    }

    /// Binds the session to a tenant.
    ///
    /// Lazy: no SQL is issued here. The actual `SET LOCAL` happens on the
    /// next [`acquire`](Self::acquire). The metadata cache is invalidated
    /// synchronously so no stale catalog entry from the previous tenant can
    /// be applied afterwards.
    pub fn set_tenant(&mut self, tenant: &TenantId) {
        self.set_tenant_with_visibility(tenant, true);
    }

    /// Binds the session to a tenant with explicit public visibility intent.
    pub fn set_tenant_with_visibility(&mut self, tenant: &TenantId, include_public: bool) {
        debug!(tenant = %tenant, "binding session to tenant");
        self.state.set_tenant(tenant.clone(), include_public);
        self.metadata.invalidate_all();
    }

    /// Binds the session by raw schema name.
    ///
    /// # Errors
    ///
    /// Fails only on a malformed schema name.
    pub fn set_schema(&mut self, schema_name: &str) -> Result<(), TenancyError> {
        let tenant = TenantId::new(schema_name)?;
        self.set_tenant(&tenant);
        Ok(())
    }

    /// Binds the session to the distinguished public tenant.
    pub fn set_schema_to_public(&mut self) {
        self.set_tenant(&TenantId::public());
    }

    /// Returns the tenant bound to this session.
    ///
    /// This is the app-side default-value resolver for tenant-scoped
    /// inserts.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyError::NoTenantBound`] when the session is unbound;
    /// never substitutes a default tenant.
    pub fn current_tenant(&self) -> Result<&TenantId, TenancyError> {
        self.state.current().ok_or(TenancyError::NoTenantBound)
    }

    /// Read access to the binding state (diagnostics and tests).
    #[must_use]
    pub fn state(&self) -> &BinderState {
        &self.state
    }

    /// The gate every statement passes through.
    ///
    /// Opens the transaction if needed, issues the session tenant setting
    /// unless the limit-set-calls mode says it is already in place, and
    /// returns the live statement handle.
    ///
    /// # Errors
    ///
    /// - [`TenancyError::Configuration`] if no tenant or schema is bound.
    /// - Database errors from the `SET LOCAL` itself propagate unchanged; in
    ///   that case `bound` stays false so the next use starts clean. The
    ///   caller's statement was going to fail anyway inside an aborted
    ///   transaction.
    pub async fn acquire(&mut self) -> Result<&DatabaseTransaction, TenancyError> {
        let Some(tenant) = self.state.current().cloned() else {
            return Err(TenancyError::Configuration(
                "no tenant/schema bound before executing a statement; \
                 call set_tenant() or set_schema_to_public() first"
                    .to_string(),
            ));
        };

        if self.txn.is_none() {
            self.txn = Some(self.db.begin().await?);
            // A fresh transaction never carries a binding, whatever the
            // flag said before.
            self.state.reset_bound();
        }

        if self.state.needs_issue() {
            let sql = policy::set_tenant_statement(&tenant);
            trace!(tenant = %tenant, "issuing session tenant setting");
            self.open_txn()?.execute_unprepared(&sql).await?;
            self.state.mark_bound();
        }

        self.open_txn()
    }

    /// Commits the session's transaction, persisting all changes.
    ///
    /// No-op when no transaction is open. The binding survives logically
    /// (`current_tenant` is unchanged) but the setting must be re-issued,
    /// since `SET LOCAL` ends with the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(&mut self) -> Result<(), TenancyError> {
        if let Some(txn) = self.txn.take() {
            txn.commit().await?;
        }
        self.state.reset_bound();
        Ok(())
    }

    /// Rolls back the session's transaction, discarding all changes.
    ///
    /// Always forces re-issuance of the setting: rollback clears
    /// session-scoped settings issued inside the aborted transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(&mut self) -> Result<(), TenancyError> {
        if let Some(txn) = self.txn.take() {
            txn.rollback().await?;
        }
        self.state.reset_bound();
        Ok(())
    }

    /// Releases the session without committing.
    ///
    /// Equivalent to dropping it: an open transaction rolls back, and the
    /// binding state is gone with the session, so a pooled connection can
    /// never retain a previous caller's tenant.
    pub fn close(mut self) {
        self.txn = None;
        self.state.reset_bound();
    }

    /// Column names of a table as seen by the current tenant, cached.
    ///
    /// # Errors
    ///
    /// Fails when the session is unbound or the catalog query fails.
    pub async fn table_columns(&mut self, table: &str) -> Result<TableColumns, TenancyError> {
        let schema = self.current_tenant()?.as_str().to_string();
        if let Some(columns) = self.metadata.get(&schema, table) {
            return Ok(columns);
        }

        let rows = {
            let txn = self.acquire().await?;
            txn.query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = $1 AND table_schema = current_schema() \
                 ORDER BY ordinal_position",
                [table.into()],
            ))
            .await?
        };

        let columns: Vec<String> = rows
            .iter()
            .map(|row| row.try_get("", "column_name"))
            .collect::<Result<_, _>>()?;
        let columns = Arc::new(columns);
        self.metadata.insert(&schema, table, Arc::clone(&columns));
        Ok(columns)
    }

    fn open_txn(&self) -> Result<&DatabaseTransaction, TenancyError> {
        self.txn.as_ref().ok_or_else(|| {
            TenancyError::Configuration("session transaction is not open".to_string())
        })
    }
}

impl std::fmt::Debug for TenantSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantSession")
            .field("state", &self.state)
            .field("txn_open", &self.txn.is_some())
            .finish_non_exhaustive()
    }
}

/// Extension trait for `DatabaseConnection` to create tenant sessions.
pub trait TenantSessionExt {
    /// Creates an unbound tenant session on this pool.
    fn tenant_session(
        &self,
        config: &TenancyConfig,
        metadata: Arc<MetadataCache>,
    ) -> TenantSession;
}

impl TenantSessionExt for DatabaseConnection {
    fn tenant_session(
        &self,
        config: &TenancyConfig,
        metadata: Arc<MetadataCache>,
    ) -> TenantSession {
        TenantSession::new(self.clone(), config, metadata)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn tenant(name: &str) -> TenantId {
        TenantId::new(name).unwrap()
    }

    #[test]
    fn test_fresh_state_is_unbound() {
        let state = BinderState::new(false);
        assert!(state.current().is_none());
        assert!(!state.is_bound());
        assert!(state.needs_issue());
    }

    #[test]
    fn test_set_tenant_forces_reissue() {
        let mut state = BinderState::new(true);
        state.set_tenant(tenant("t1"), true);
        state.mark_bound();
        assert!(!state.needs_issue());

        // Rebinding must always invalidate the previous issuance.
        state.set_tenant(tenant("t2"), true);
        assert!(!state.is_bound());
        assert!(state.needs_issue());
        assert_eq!(state.current(), Some(&tenant("t2")));
    }

    #[rstest]
    #[case(false, true)]
    #[case(true, false)]
    fn test_reissue_policy_while_bound(#[case] limit_set_calls: bool, #[case] expected: bool) {
        let mut state = BinderState::new(limit_set_calls);
        state.set_tenant(tenant("t1"), true);
        state.mark_bound();
        // Default mode re-issues on every statement; the opt-in skips it.
        assert_eq!(state.needs_issue(), expected);
    }

    #[test]
    fn test_reset_after_rollback_forces_reissue() {
        let mut state = BinderState::new(true);
        state.set_tenant(tenant("t1"), true);
        state.mark_bound();
        state.reset_bound();
        assert!(state.needs_issue());
    }

    #[test]
    fn test_include_public_is_recorded() {
        let mut state = BinderState::new(false);
        state.set_tenant(tenant("t1"), false);
        assert!(!state.include_public());
    }

    #[tokio::test]
    async fn test_unbound_session_rejects_statements() {
        let db = sea_orm::DatabaseConnection::Disconnected;
        let mut session =
            TenantSession::new(db, &TenancyConfig::default(), Arc::new(MetadataCache::default()));

        let err = session.acquire().await.unwrap_err();
        assert!(matches!(err, TenancyError::Configuration(_)));
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_current_tenant_requires_binding() {
        let db = sea_orm::DatabaseConnection::Disconnected;
        let mut session =
            TenantSession::new(db, &TenancyConfig::default(), Arc::new(MetadataCache::default()));

        assert!(matches!(
            session.current_tenant(),
            Err(TenancyError::NoTenantBound)
        ));

        session.set_schema_to_public();
        assert!(session.current_tenant().unwrap().is_public());
    }

    #[test]
    fn test_set_tenant_invalidates_metadata_cache() {
        let metadata = Arc::new(MetadataCache::new(16));
        metadata.insert("t1", "notes", Arc::new(vec!["id".into()]));

        let db = sea_orm::DatabaseConnection::Disconnected;
        let mut session = TenantSession::new(db, &TenancyConfig::default(), Arc::clone(&metadata));
        session.set_tenant(&tenant("t2"));

        assert!(metadata.get("t1", "notes").is_none());
    }

    #[test]
    fn test_set_schema_rejects_malformed_names() {
        let db = sea_orm::DatabaseConnection::Disconnected;
        let mut session =
            TenantSession::new(db, &TenancyConfig::default(), Arc::new(MetadataCache::default()));
        assert!(matches!(
            session.set_schema("Robert'); DROP TABLE tenants;--"),
            Err(TenancyError::InvalidTenant(_))
        ));
    }
}

//! RLS policy synchronizer.
//!
//! Executes the policy bundle DDL whenever a tenant-scoped table or field is
//! created or removed. Runs inside the caller's schema-evolution
//! transaction; on any failure the whole bundle aborts with the transaction,
//! so the database is never left with a half-applied policy.
//!
//! Migration DDL is assumed to be serialized by the migration tool; the
//! synchronizer adds no locking of its own.

use sea_orm::{ConnectionTrait, DbBackend, DbErr, Statement};
use tracing::{debug, info};

use rowfence_core::policy;
use rowfence_core::schema::{FieldDecl, TableDecl};

use crate::error::TenancyError;

/// Catalog-observed RLS state of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRlsState {
    /// `pg_class.relrowsecurity`.
    pub enabled: bool,
    /// `pg_class.relforcerowsecurity`.
    pub forced: bool,
    /// Number of policies named by the tenant isolation convention.
    pub policy_count: u64,
}

/// Issues RLS policy DDL against a live connection.
///
/// Generic over [`ConnectionTrait`] so migrations can hand in the
/// `SchemaManager` connection directly.
#[derive(Debug)]
pub struct PolicySynchronizer<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PolicySynchronizer<'a, C> {
    /// Creates a synchronizer over an open connection or transaction.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Installs `get_current_tenant()`.
    ///
    /// `CREATE OR REPLACE`, so re-running is safe.
    ///
    /// # Errors
    ///
    /// Returns a [`TenancyError::Database`] error if issuance fails.
    pub async fn install_current_tenant_function(&self) -> Result<(), TenancyError> {
        self.conn
            .execute_unprepared(&policy::create_current_tenant_function())
            .await?;
        Ok(())
    }

    /// Hook for table creation.
    ///
    /// Installs the full policy bundle when any declared field requires RLS.
    /// The table itself (including the discriminator column) must already
    /// exist; column DDL is the migration's job.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyError::PolicySync`] if any statement of the bundle
    /// fails.
    pub async fn on_create_table(&self, table: &TableDecl) -> Result<(), TenancyError> {
        if table.requires_rls() {
            self.install_bundle(&table.name).await?;
        }
        Ok(())
    }

    /// Hook for field addition.
    ///
    /// Gated solely on the new field's own flag. Adding a second
    /// RLS-requiring field to an already-policed table is a no-op: the
    /// bundle install checks the catalog first, so the policy name never
    /// collides.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyError::PolicySync`] if any statement of the bundle
    /// fails.
    pub async fn on_add_field(
        &self,
        table: &TableDecl,
        field: &FieldDecl,
    ) -> Result<(), TenancyError> {
        if field.requires_rls() {
            self.install_bundle(&table.name).await?;
        }
        Ok(())
    }

    /// Hook for field removal.
    ///
    /// Tears the bundle down only when the removed field required RLS and no
    /// other remaining field on the table does (last-one-out rule), so no
    /// orphaned policy is left referencing an absent column. `table` is the
    /// declaration as it was before the removal.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyError::PolicySync`] if teardown fails.
    pub async fn on_remove_field(
        &self,
        table: &TableDecl,
        field: &FieldDecl,
    ) -> Result<(), TenancyError> {
        let others_remain = table.rls_fields_excluding(&field.name) > 0;
        if field.requires_rls() && !others_remain {
            self.teardown_bundle(&table.name).await?;
        }
        Ok(())
    }

    /// Returns whether the tenant isolation policy exists for a table.
    ///
    /// # Errors
    ///
    /// Returns a database error if the catalog query fails.
    pub async fn policy_exists(&self, table: &str) -> Result<bool, TenancyError> {
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT COUNT(*) AS n FROM pg_policies \
                 WHERE tablename = $1 AND policyname = $2",
                [table.into(), policy::policy_name(table).into()],
            ))
            .await?;
        let count: i64 = match row {
            Some(row) => row.try_get("", "n")?,
            None => 0,
        };
        Ok(count > 0)
    }

    /// Reads the catalog RLS state of a table, for verification and tests.
    ///
    /// # Errors
    ///
    /// Fails when the table does not exist or the catalog query fails.
    pub async fn table_rls_state(&self, table: &str) -> Result<TableRlsState, TenancyError> {
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT c.relrowsecurity AS enabled, c.relforcerowsecurity AS forced, \
                 (SELECT COUNT(*) FROM pg_policies p \
                  WHERE p.tablename = c.relname AND p.policyname = $2) AS policies \
                 FROM pg_class c WHERE c.relname = $1",
                [table.into(), policy::policy_name(table).into()],
            ))
            .await?
            .ok_or_else(|| {
                TenancyError::Database(DbErr::RecordNotFound(format!(
                    "table not found in catalog: {table}"
                )))
            })?;

        let policies: i64 = row.try_get("", "policies")?;
        Ok(TableRlsState {
            enabled: row.try_get("", "enabled")?,
            forced: row.try_get("", "forced")?,
            policy_count: policies.unsigned_abs(),
        })
    }

    async fn install_bundle(&self, table: &str) -> Result<(), TenancyError> {
        if self.policy_exists(table).await? {
            debug!(table, "tenant isolation policy already present, skipping");
            return Ok(());
        }

        // Order matters: the policy must never be observable on a table that
        // is not both enabled and forced.
        for sql in [
            policy::enable_rls(table),
            policy::force_rls(table),
            policy::create_policy(table),
            policy::set_tenant_column_default(table),
        ] {
            self.execute(table, &sql).await?;
        }

        info!(table, "installed tenant isolation policy bundle");
        Ok(())
    }

    async fn teardown_bundle(&self, table: &str) -> Result<(), TenancyError> {
        for sql in [policy::disable_rls(table), policy::drop_policy(table)] {
            self.execute(table, &sql).await?;
        }

        info!(table, "removed tenant isolation policy bundle");
        Ok(())
    }

    async fn execute(&self, table: &str, sql: &str) -> Result<(), TenancyError> {
        self.conn
            .execute_unprepared(sql)
            .await
            .map_err(|source| TenancyError::PolicySync {
                table: table.to_string(),
                source,
            })?;
        Ok(())
    }
}

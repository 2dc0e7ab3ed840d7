//! Row-level-security DDL and session-setting vocabulary.
//!
//! Everything here is part of the durable contract with already-migrated
//! databases: the session setting name, the policy naming scheme, the
//! discriminator column, and the `get_current_tenant()` function. Changing
//! any of them breaks compatibility with existing schemas.
//!
//! The statements are plain strings; execution lives in `rowfence-db`.

use crate::tenant::TenantId;

/// Session-scoped setting read by the RLS policies.
///
/// The application issues `SET LOCAL rowfence.tenant = '<schema>'` before any
/// statement; the policies compare the discriminator column against it via
/// [`CURRENT_TENANT_FUNCTION`].
pub const TENANT_SETTING: &str = "rowfence.tenant";

/// Discriminator column on every tenant-scoped table.
pub const TENANT_COLUMN: &str = "tenant_id";

/// Name of the SQL function resolving the current session tenant.
pub const CURRENT_TENANT_FUNCTION: &str = "get_current_tenant";

/// Prefix of the per-table tenant isolation policy name.
const POLICY_PREFIX: &str = "_po_tenant_";

/// Returns the deterministic policy name for a table.
///
/// Derived purely from the table name so create/drop/lookup never need a
/// side lookup table.
#[must_use]
pub fn policy_name(table: &str) -> String {
    format!("{POLICY_PREFIX}{table}")
}

/// `CREATE OR REPLACE` statement for the session tenant resolver function.
///
/// STABLE with a very high cost so the planner evaluates the policy
/// comparison once per statement instead of inlining it per row.
#[must_use]
pub fn create_current_tenant_function() -> String {
    format!(
        "CREATE OR REPLACE FUNCTION {CURRENT_TENANT_FUNCTION}() RETURNS VARCHAR AS $$ \
         SELECT current_setting('{TENANT_SETTING}') \
         $$ LANGUAGE SQL STABLE COST 100000"
    )
}

/// `ALTER TABLE ... ENABLE ROW LEVEL SECURITY` for a table.
#[must_use]
pub fn enable_rls(table: &str) -> String {
    format!("ALTER TABLE \"{table}\" ENABLE ROW LEVEL SECURITY")
}

/// `ALTER TABLE ... DISABLE ROW LEVEL SECURITY` for a table.
#[must_use]
pub fn disable_rls(table: &str) -> String {
    format!("ALTER TABLE \"{table}\" DISABLE ROW LEVEL SECURITY")
}

/// `ALTER TABLE ... FORCE ROW LEVEL SECURITY` for a table.
///
/// Without FORCE the table owner silently bypasses the policy.
#[must_use]
pub fn force_rls(table: &str) -> String {
    format!("ALTER TABLE \"{table}\" FORCE ROW LEVEL SECURITY")
}

/// `CREATE POLICY` statement for the tenant isolation policy of a table.
///
/// The predicate is symmetric: USING blocks reading other tenants' rows,
/// WITH CHECK blocks writing rows attributed to another tenant.
#[must_use]
pub fn create_policy(table: &str) -> String {
    format!(
        "CREATE POLICY {policy} ON \"{table}\" FOR ALL \
         USING ({TENANT_COLUMN} = {CURRENT_TENANT_FUNCTION}()) \
         WITH CHECK ({TENANT_COLUMN} = {CURRENT_TENANT_FUNCTION}())",
        policy = policy_name(table),
    )
}

/// `DROP POLICY IF EXISTS` statement for the tenant isolation policy.
#[must_use]
pub fn drop_policy(table: &str) -> String {
    format!(
        "DROP POLICY IF EXISTS {policy} ON \"{table}\"",
        policy = policy_name(table),
    )
}

/// Statement binding the discriminator column default to the session tenant.
///
/// Inserts that omit the column still land in the bound tenant without every
/// caller having to supply it.
#[must_use]
pub fn set_tenant_column_default(table: &str) -> String {
    format!(
        "ALTER TABLE ONLY \"{table}\" ALTER COLUMN {TENANT_COLUMN} \
         SET DEFAULT {CURRENT_TENANT_FUNCTION}()"
    )
}

/// `SET LOCAL` statement binding the session to a tenant.
///
/// Transaction-scoped: rollback or commit both clear it, which is why the
/// binder re-issues it per transaction. Interpolation is safe because
/// [`TenantId`] only admits unquoted-identifier characters.
#[must_use]
pub fn set_tenant_statement(tenant: &TenantId) -> String {
    format!("SET LOCAL {TENANT_SETTING} = '{}'", tenant.as_str())
}

/// Canonical DDL fragment for the discriminator column of a tenant-scoped
/// table, for use inside `CREATE TABLE` / `ADD COLUMN`.
///
/// Deleting a tenant with scoped rows is rejected (RESTRICT), never cascaded.
#[must_use]
pub fn tenant_column_ddl(tenants_table: &str) -> String {
    format!(
        "{TENANT_COLUMN} VARCHAR(63) NOT NULL \
         REFERENCES \"{tenants_table}\"(schema_name) ON DELETE RESTRICT"
    )
}

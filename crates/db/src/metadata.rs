//! Process-wide per-schema metadata cache.
//!
//! Column metadata is keyed by schema and table. Entries must never survive a
//! tenant switch: in schema-per-tenant deployments the catalogs differ
//! structurally, and even under one shared schema a cache keyed by object
//! identity must not leak across tenants. The binder clears the cache
//! synchronously on every `set_tenant`/`set_schema`, before the next
//! statement is issued.

use std::sync::Arc;

use moka::sync::Cache;

use crate::config::TenancyConfig;

/// Cached column names for one table as seen from one schema.
pub type TableColumns = Arc<Vec<String>>;

/// Shared metadata cache, cheap to clone.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    inner: Cache<String, TableColumns>,
}

impl MetadataCache {
    /// Creates a cache holding up to `capacity` tables.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    /// Creates a cache sized by the configured capacity.
    #[must_use]
    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(config.metadata_cache_capacity)
    }

    /// Maximum number of entries the cache will hold.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.inner.policy().max_capacity().unwrap_or(u64::MAX)
    }

    /// Looks up cached columns for a table under a schema.
    #[must_use]
    pub fn get(&self, schema: &str, table: &str) -> Option<TableColumns> {
        self.inner.get(&Self::key(schema, table))
    }

    /// Stores columns for a table under a schema.
    pub fn insert(&self, schema: &str, table: &str, columns: TableColumns) {
        self.inner.insert(Self::key(schema, table), columns);
    }

    /// Drops every entry. Called on tenant switch.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Number of live entries (test/diagnostic use).
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    fn key(schema: &str, table: &str) -> String {
        format!("{schema}:{table}")
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::from_config(&TenancyConfig::default())
    }
}

//! Startup-time schema registry.

use std::collections::BTreeMap;

use thiserror::Error;

use super::declaration::{TableDecl, TableScope};

/// Error building a [`SchemaRegistry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two declarations used the same table name.
    #[error("table declared twice in schema registry: {0}")]
    DuplicateTable(String),
}

/// Immutable registry of every declared table.
///
/// Built once at application startup; iteration order is deterministic
/// (alphabetical by table name) so check output is stable across runs.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableDecl>,
}

impl SchemaRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder {
            tables: BTreeMap::new(),
            duplicate: None,
        }
    }

    /// Looks up a table declaration by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDecl> {
        self.tables.get(name)
    }

    /// Iterates all declared tables.
    pub fn tables(&self) -> impl Iterator<Item = &TableDecl> {
        self.tables.values()
    }

    /// Iterates only the tenant-scoped tables.
    pub fn tenant_scoped_tables(&self) -> impl Iterator<Item = &TableDecl> {
        self.tables
            .values()
            .filter(|t| t.scope == TableScope::TenantScoped)
    }

    /// Number of declared tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no tables are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Builder for [`SchemaRegistry`].
#[derive(Debug)]
pub struct SchemaRegistryBuilder {
    tables: BTreeMap<String, TableDecl>,
    duplicate: Option<String>,
}

impl SchemaRegistryBuilder {
    /// Adds a table declaration.
    #[must_use]
    pub fn table(mut self, table: TableDecl) -> Self {
        if self.tables.contains_key(&table.name) {
            self.duplicate.get_or_insert(table.name.clone());
        }
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Finishes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTable`] if a table name was declared
    /// twice.
    pub fn build(self) -> Result<SchemaRegistry, RegistryError> {
        if let Some(name) = self.duplicate {
            return Err(RegistryError::DuplicateTable(name));
        }
        Ok(SchemaRegistry {
            tables: self.tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::FieldDecl;

    use super::*;

    #[test]
    fn test_registry_lookup_and_scoping() {
        let registry = SchemaRegistry::builder()
            .table(TableDecl::shared("tenants").field(FieldDecl::scalar("schema_name")))
            .table(
                TableDecl::tenant_scoped("notes")
                    .field(FieldDecl::tenant_relation())
                    .field(FieldDecl::scalar("body")),
            )
            .build()
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.table("notes").is_some());
        assert!(registry.table("missing").is_none());

        let scoped: Vec<_> = registry.tenant_scoped_tables().map(|t| t.name.as_str()).collect();
        assert_eq!(scoped, vec!["notes"]);
    }

    #[test]
    fn test_duplicate_table_is_rejected() {
        let result = SchemaRegistry::builder()
            .table(TableDecl::tenant_scoped("notes"))
            .table(TableDecl::tenant_scoped("notes"))
            .build();
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateTable("notes".into()));
    }

    #[test]
    fn test_iteration_is_alphabetical() {
        let registry = SchemaRegistry::builder()
            .table(TableDecl::tenant_scoped("zebra"))
            .table(TableDecl::tenant_scoped("alpha"))
            .build()
            .unwrap();
        let names: Vec<_> = registry.tables().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zebra"]);
    }
}

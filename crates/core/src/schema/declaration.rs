//! Table and field declarations.

use serde::Serialize;

use crate::policy;

/// Referential action taken on the relation target's deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferentialAction {
    /// Reject the delete while referencing rows exist.
    Restrict,
    /// Delete referencing rows along with the target.
    Cascade,
}

/// The marker that a field establishes the row's owning tenant.
///
/// Fields of this kind always require RLS; deleting a tenant while scoped
/// rows reference it is rejected by default rather than cascaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantRelation {
    /// Action on tenant deletion.
    pub on_delete: ReferentialAction,
}

impl Default for TenantRelation {
    fn default() -> Self {
        Self {
            on_delete: ReferentialAction::Restrict,
        }
    }
}

/// Kind of a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    /// Plain column with no relation.
    Scalar,
    /// Ordinary foreign key to another table. Never carries the RLS flag.
    ForeignKey {
        /// Referenced table name.
        target: String,
    },
    /// Tenant-scoping relation to the tenants table.
    TenantRelation(TenantRelation),
    /// Many-to-many relation backed by a junction table.
    ManyToMany {
        /// Junction table name; checked by rule C3.
        through: String,
    },
}

/// A declared field on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    /// Column / field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
}

impl FieldDecl {
    /// Declares a scalar column.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar,
        }
    }

    /// Declares a plain foreign key.
    pub fn foreign_key(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ForeignKey {
                target: target.into(),
            },
        }
    }

    /// Declares the tenant relation field under its canonical column name.
    #[must_use]
    pub fn tenant_relation() -> Self {
        Self {
            name: policy::TENANT_COLUMN.to_string(),
            kind: FieldKind::TenantRelation(TenantRelation::default()),
        }
    }

    /// Declares a many-to-many relation through a junction table.
    pub fn many_to_many(name: impl Into<String>, through: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ManyToMany {
                through: through.into(),
            },
        }
    }

    /// Returns `true` if this field demands the RLS policy bundle.
    ///
    /// Constantly true for tenant relations, false for everything else; a
    /// plain foreign key to the tenants table does not count (rule C2).
    #[must_use]
    pub fn requires_rls(&self) -> bool {
        matches!(self.kind, FieldKind::TenantRelation(_))
    }
}

/// Whether a table holds per-tenant or shared rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableScope {
    /// Rows are owned by tenants; the table must carry the policy bundle.
    TenantScoped,
    /// Shared/administrative table (e.g. the tenants table itself).
    Shared,
}

/// A declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDecl {
    /// Table name.
    pub name: String,
    /// Tenant-scoped or shared.
    pub scope: TableScope,
    /// Declared fields.
    pub fields: Vec<FieldDecl>,
    /// Composite uniqueness constraints, one column list each.
    pub unique_together: Vec<Vec<String>>,
    /// True for implicit junction tables the application never declared
    /// directly. Only affects check messages.
    pub auto_created: bool,
}

impl TableDecl {
    /// Starts a tenant-scoped table declaration.
    pub fn tenant_scoped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: TableScope::TenantScoped,
            fields: Vec::new(),
            unique_together: Vec::new(),
            auto_created: false,
        }
    }

    /// Starts a shared table declaration.
    pub fn shared(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: TableScope::Shared,
            fields: Vec::new(),
            unique_together: Vec::new(),
            auto_created: false,
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a composite uniqueness constraint.
    #[must_use]
    pub fn unique_together<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_together
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Marks the table as an implicit junction table.
    #[must_use]
    pub fn auto_created(mut self) -> Self {
        self.auto_created = true;
        self
    }

    /// Returns the field carrying the discriminator column, if declared.
    #[must_use]
    pub fn tenant_field(&self) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == policy::TENANT_COLUMN)
    }

    /// Returns `true` if any declared field requires the RLS bundle.
    #[must_use]
    pub fn requires_rls(&self) -> bool {
        self.fields.iter().any(FieldDecl::requires_rls)
    }

    /// Counts fields requiring RLS, excluding the named field.
    ///
    /// Used by the synchronizer's last-field-out rule on field removal.
    #[must_use]
    pub fn rls_fields_excluding(&self, field_name: &str) -> usize {
        self.fields
            .iter()
            .filter(|f| f.name != field_name && f.requires_rls())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_relation_requires_rls() {
        assert!(FieldDecl::tenant_relation().requires_rls());
        assert!(!FieldDecl::scalar("body").requires_rls());
        assert!(!FieldDecl::foreign_key("tenant_id", "tenants").requires_rls());
    }

    #[test]
    fn test_tenant_relation_defaults_to_restrict() {
        let relation = TenantRelation::default();
        assert_eq!(relation.on_delete, ReferentialAction::Restrict);
    }

    #[test]
    fn test_table_rls_detection() {
        let plain = TableDecl::tenant_scoped("notes").field(FieldDecl::scalar("body"));
        assert!(!plain.requires_rls());

        let scoped = plain.field(FieldDecl::tenant_relation());
        assert!(scoped.requires_rls());
        assert!(scoped.tenant_field().is_some());
    }

    #[test]
    fn test_rls_fields_excluding() {
        let table = TableDecl::tenant_scoped("notes")
            .field(FieldDecl::tenant_relation())
            .field(FieldDecl::scalar("body"));
        assert_eq!(table.rls_fields_excluding("tenant_id"), 0);
        assert_eq!(table.rls_fields_excluding("body"), 1);
    }
}

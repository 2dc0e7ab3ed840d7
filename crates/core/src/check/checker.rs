//! The consistency rules.
//!
//! Rule C1 (critical): every tenant-scoped table declares exactly one tenant
//! relation field. C2 (warning): the field is of the tenant-relation kind,
//! not a plain foreign key. C3 (warning): junction tables behind
//! many-to-many relations carry the tenant field too. C4 (warning):
//! composite uniqueness constraints include the discriminator column.

use crate::policy;
use crate::schema::{FieldKind, SchemaRegistry, TableDecl};

use super::findings::{Finding, Severity};

/// Runs all consistency rules over the registry.
#[must_use]
pub fn run_checks(registry: &SchemaRegistry) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in registry.tenant_scoped_tables() {
        check_tenant_field(table, &mut findings);
        check_m2m_fields(registry, table, &mut findings);
        check_unique_together(table, &mut findings);
    }

    findings
}

fn check_tenant_field(table: &TableDecl, findings: &mut Vec<Finding>) {
    let Some(tenant_field) = table.tenant_field() else {
        findings.push(Finding {
            severity: Severity::Critical,
            code: "tenant_field.C001",
            table: table.name.clone(),
            message: format!("tenant field not present in {}", table.name),
            hint: Some(format!(
                "declare a {} tenant relation field on the table",
                policy::TENANT_COLUMN
            )),
        });
        return;
    };

    let relation_count = table
        .fields
        .iter()
        .filter(|f| f.requires_rls())
        .count();
    if relation_count > 1 {
        findings.push(Finding {
            severity: Severity::Critical,
            code: "tenant_field.C001",
            table: table.name.clone(),
            message: format!(
                "{} declares {relation_count} tenant relation fields, expected exactly one",
                table.name
            ),
            hint: None,
        });
        return;
    }

    if !tenant_field.requires_rls() {
        findings.push(Finding {
            severity: Severity::Warning,
            code: "tenant_field.W001",
            table: table.name.clone(),
            message: format!(
                "tenant field isn't a tenant relation in {}; a plain foreign key \
                 bypasses the RLS flag and default resolver",
                table.name
            ),
            hint: Some("use FieldDecl::tenant_relation() instead of a foreign key".into()),
        });
    }
}

fn check_m2m_fields(registry: &SchemaRegistry, table: &TableDecl, findings: &mut Vec<Finding>) {
    for field in &table.fields {
        let FieldKind::ManyToMany { through } = &field.kind else {
            continue;
        };

        let junction = registry.table(through);
        let junction_tenant_field = junction.and_then(TableDecl::tenant_field);

        let kind = match junction {
            Some(decl) if decl.auto_created => "auto-created",
            Some(_) => "manual",
            // Undeclared junctions behave like auto-created ones.
            None => "auto-created",
        };

        match junction_tenant_field {
            None => findings.push(Finding {
                severity: Severity::Warning,
                code: "m2m_field.W001",
                table: through.clone(),
                message: format!(
                    "tenant field not present in many-to-many {kind} junction table {through}"
                ),
                hint: Some(format!(
                    "declare the junction table for {}.{} explicitly with a tenant relation field",
                    table.name, field.name
                )),
            }),
            Some(tenant_field) if !tenant_field.requires_rls() => findings.push(Finding {
                severity: Severity::Warning,
                code: "m2m_field.W002",
                table: through.clone(),
                message: format!(
                    "tenant field isn't a tenant relation in junction table {through}"
                ),
                hint: None,
            }),
            Some(_) => {}
        }
    }
}

fn check_unique_together(table: &TableDecl, findings: &mut Vec<Finding>) {
    for constraint in &table.unique_together {
        if !constraint.iter().any(|c| c == policy::TENANT_COLUMN) {
            findings.push(Finding {
                severity: Severity::Warning,
                code: "unique_together.W001",
                table: table.name.clone(),
                message: format!(
                    "tenant field isn't in unique constraint on {}: ({}); uniqueness is \
                     enforced across tenants",
                    table.name,
                    constraint.join(", ")
                ),
                hint: Some(format!("add {} to the constraint", policy::TENANT_COLUMN)),
            });
        }
    }
}

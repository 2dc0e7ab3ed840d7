//! Checker rule tests.

use crate::schema::{FieldDecl, SchemaRegistry, TableDecl};

use super::findings::{Severity, enforce};
use super::run_checks;

fn registry(tables: Vec<TableDecl>) -> SchemaRegistry {
    let mut builder = SchemaRegistry::builder();
    for table in tables {
        builder = builder.table(table);
    }
    builder.build().unwrap()
}

fn scoped_with_tenant(name: &str) -> TableDecl {
    TableDecl::tenant_scoped(name)
        .field(FieldDecl::tenant_relation())
        .field(FieldDecl::scalar("body"))
}

#[test]
fn test_well_formed_schema_has_no_findings() {
    let registry = registry(vec![
        TableDecl::shared("tenants").field(FieldDecl::scalar("schema_name")),
        scoped_with_tenant("notes"),
    ]);
    assert!(run_checks(&registry).is_empty());
}

#[test]
fn test_c1_missing_tenant_field_is_critical() {
    let registry = registry(vec![
        TableDecl::tenant_scoped("notes").field(FieldDecl::scalar("body")),
    ]);

    let findings = run_checks(&registry);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Critical);
    assert_eq!(findings[0].code, "tenant_field.C001");
    assert_eq!(findings[0].table, "notes");
    assert!(enforce(&findings).is_err());
}

#[test]
fn test_c1_shared_tables_are_exempt() {
    let registry = registry(vec![
        TableDecl::shared("tenants").field(FieldDecl::scalar("schema_name")),
    ]);
    assert!(run_checks(&registry).is_empty());
}

#[test]
fn test_c1_duplicate_tenant_relation_is_critical() {
    let mut table = scoped_with_tenant("notes");
    let mut second = FieldDecl::tenant_relation();
    second.name = "owner_tenant".into();
    table = table.field(second);

    let findings = run_checks(&registry(vec![table]));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].code, "tenant_field.C001");
    assert!(findings[0].message.contains("exactly one"));
}

#[test]
fn test_c2_plain_foreign_key_is_warning() {
    let registry = registry(vec![
        TableDecl::tenant_scoped("notes")
            .field(FieldDecl::foreign_key("tenant_id", "tenants"))
            .field(FieldDecl::scalar("body")),
    ]);

    let findings = run_checks(&registry);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(findings[0].code, "tenant_field.W001");
    // warnings alone do not abort startup
    assert!(enforce(&findings).is_ok());
}

#[test]
fn test_c3_junction_without_tenant_field_is_warning() {
    let registry = registry(vec![
        scoped_with_tenant("notes").field(FieldDecl::many_to_many("tags", "note_tags")),
        scoped_with_tenant("tags"),
        TableDecl::tenant_scoped("note_tags")
            .auto_created()
            .field(FieldDecl::foreign_key("note_id", "notes"))
            .field(FieldDecl::foreign_key("tag_id", "tags")),
    ]);

    let findings = run_checks(&registry);
    // The junction itself also fails C1; exactly one C3 finding references it
    // through the m2m rule.
    let m2m: Vec<_> = findings.iter().filter(|f| f.code == "m2m_field.W001").collect();
    assert_eq!(m2m.len(), 1);
    assert_eq!(m2m[0].table, "note_tags");
    assert!(m2m[0].message.contains("auto-created"));
}

#[test]
fn test_c3_clears_when_junction_declares_tenant_relation() {
    let registry = registry(vec![
        scoped_with_tenant("notes").field(FieldDecl::many_to_many("tags", "note_tags")),
        scoped_with_tenant("tags"),
        TableDecl::tenant_scoped("note_tags")
            .field(FieldDecl::tenant_relation())
            .field(FieldDecl::foreign_key("note_id", "notes"))
            .field(FieldDecl::foreign_key("tag_id", "tags")),
    ]);

    assert!(run_checks(&registry).is_empty());
}

#[test]
fn test_c3_junction_with_plain_fk_tenant_field() {
    let registry = registry(vec![
        scoped_with_tenant("notes").field(FieldDecl::many_to_many("tags", "note_tags")),
        scoped_with_tenant("tags"),
        TableDecl::tenant_scoped("note_tags")
            .field(FieldDecl::foreign_key("tenant_id", "tenants"))
            .field(FieldDecl::foreign_key("note_id", "notes")),
    ]);

    let findings = run_checks(&registry);
    assert!(findings.iter().any(|f| f.code == "m2m_field.W002" && f.table == "note_tags"));
}

#[test]
fn test_c3_undeclared_junction_is_reported_as_auto_created() {
    let registry = registry(vec![
        scoped_with_tenant("notes").field(FieldDecl::many_to_many("tags", "note_tags")),
    ]);

    let findings = run_checks(&registry);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].code, "m2m_field.W001");
    assert!(findings[0].message.contains("auto-created"));
}

#[test]
fn test_c4_unique_together_without_tenant_column() {
    let registry = registry(vec![
        scoped_with_tenant("notes").unique_together(["title", "author"]),
    ]);

    let findings = run_checks(&registry);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].code, "unique_together.W001");
    assert_eq!(findings[0].severity, Severity::Warning);
}

#[test]
fn test_c4_clears_when_tenant_column_included() {
    let registry = registry(vec![
        scoped_with_tenant("notes").unique_together(["tenant_id", "title", "author"]),
    ]);
    assert!(run_checks(&registry).is_empty());
}

#[test]
fn test_findings_are_deterministically_ordered() {
    let build = || {
        registry(vec![
            TableDecl::tenant_scoped("alpha"),
            TableDecl::tenant_scoped("zebra"),
        ])
    };
    let first = run_checks(&build());
    let second = run_checks(&build());
    assert_eq!(first, second);
    assert_eq!(first[0].table, "alpha");
    assert_eq!(first[1].table, "zebra");
}

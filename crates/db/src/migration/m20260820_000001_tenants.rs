//! Initial migration: tenants table and the session tenant resolver
//! function.
//!
//! The tenants table is shared data with no RLS of its own. The
//! `get_current_tenant()` function is the durable half of the RLS contract:
//! every policy predicate and discriminator column default created later
//! resolves through it.

use sea_orm_migration::prelude::*;

use crate::sync::PolicySynchronizer;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(TENANTS_SQL).await?;

        PolicySynchronizer::new(db)
            .install_current_tenant_function()
            .await
            .map_err(|err| DbErr::Migration(err.to_string()))?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const TENANTS_SQL: &str = r"
-- ============================================================
-- TENANTS (shared, no RLS)
-- schema_name is the RLS discriminator target; stable once rows
-- exist under it, renaming requires an explicit migration.
-- ============================================================

CREATE TABLE tenants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    schema_name VARCHAR(63) NOT NULL UNIQUE,
    domain_url VARCHAR(128) UNIQUE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- The public tenant always exists.
INSERT INTO tenants (schema_name) VALUES ('public');
";

const DROP_SQL: &str = r"
DROP FUNCTION IF EXISTS get_current_tenant();
DROP TABLE IF EXISTS tenants;
";

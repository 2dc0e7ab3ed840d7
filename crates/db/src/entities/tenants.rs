//! `SeaORM` Entity for the tenants table.
//!
//! The tenants table itself is shared administrative data and carries no RLS
//! policy; tenant-scoped tables reference `schema_name` as their
//! discriminator target.

use rowfence_core::tenant::{TenantId, TenantIdError};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub schema_name: String,
    pub domain_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Returns the validated identity for this tenant row.
    ///
    /// # Errors
    ///
    /// Fails if the persisted schema name is not a valid identifier (should
    /// be impossible for rows created through this crate).
    pub fn tenant_id(&self) -> Result<TenantId, TenantIdError> {
        TenantId::new(self.schema_name.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

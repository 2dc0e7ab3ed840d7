//! Tenant repository for database operations.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::info;
use uuid::Uuid;

use rowfence_core::tenant::{TenantEvents, TenantId};

use crate::entities::tenants;
use crate::error::TenancyError;

/// Tenant repository for CRUD operations.
///
/// Creation dispatches the registered `TenantEvents` handlers synchronously
/// after the row is persisted, so provisioning collaborators run exactly
/// once per new tenant, in registration order.
#[derive(Clone)]
pub struct TenantRepository {
    db: DatabaseConnection,
    events: Arc<TenantEvents>,
}

impl TenantRepository {
    /// Creates a new tenant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, events: Arc<TenantEvents>) -> Self {
        Self { db, events }
    }

    /// Persists a new tenant and fires the creation event.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, e.g. on a duplicate schema
    /// name.
    pub async fn create(
        &self,
        tenant: &TenantId,
        domain_url: Option<&str>,
    ) -> Result<tenants::Model, TenancyError> {
        let now = chrono::Utc::now().into();

        let model = tenants::ActiveModel {
            id: Set(Uuid::new_v4()),
            schema_name: Set(tenant.as_str().to_string()),
            domain_url: Set(domain_url.map(str::to_string)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = model.insert(&self.db).await?;
        info!(tenant = %tenant, "tenant created");
        self.events.emit_created(tenant);

        Ok(model)
    }

    /// Finds a tenant by schema name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_schema_name(
        &self,
        schema_name: &str,
    ) -> Result<Option<tenants::Model>, TenancyError> {
        Ok(tenants::Entity::find()
            .filter(tenants::Column::SchemaName.eq(schema_name))
            .one(&self.db)
            .await?)
    }

    /// Finds a tenant by its routing domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_domain_url(
        &self,
        domain_url: &str,
    ) -> Result<Option<tenants::Model>, TenancyError> {
        Ok(tenants::Entity::find()
            .filter(tenants::Column::DomainUrl.eq(domain_url))
            .one(&self.db)
            .await?)
    }

    /// Checks if a schema name is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn schema_name_exists(&self, schema_name: &str) -> Result<bool, TenancyError> {
        let count = tenants::Entity::find()
            .filter(tenants::Column::SchemaName.eq(schema_name))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

impl std::fmt::Debug for TenantRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantRepository")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

//! Tenant identity and lifecycle events.

pub mod events;
pub mod identity;

pub use events::TenantEvents;
pub use identity::{PUBLIC_SCHEMA_NAME, TenantId, TenantIdError};

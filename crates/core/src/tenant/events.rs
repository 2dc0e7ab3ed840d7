//! Tenant lifecycle event dispatch.
//!
//! Provisioning collaborators (billing setup, default data, etc.) subscribe
//! to tenant creation. Dispatch is an explicit, ordered handler list rather
//! than an implicit broadcast: exactly the registered handlers run, in
//! registration order, synchronously after the tenant row is persisted.

use tracing::debug;

use super::identity::TenantId;

/// A handler invoked when a tenant is first persisted.
pub type TenantCreatedHandler = Box<dyn Fn(&TenantId) + Send + Sync>;

/// Ordered registry of tenant lifecycle handlers.
#[derive(Default)]
pub struct TenantEvents {
    created: Vec<(String, TenantCreatedHandler)>,
}

impl TenantEvents {
    /// Creates an empty event registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named handler for tenant creation.
    ///
    /// Handlers run in registration order. The name identifies the handler
    /// in logs.
    pub fn on_created(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&TenantId) + Send + Sync + 'static,
    ) {
        self.created.push((name.into(), Box::new(handler)));
    }

    /// Dispatches the creation event for a newly persisted tenant.
    pub fn emit_created(&self, tenant: &TenantId) {
        for (name, handler) in &self.created {
            debug!(handler = %name, tenant = %tenant, "dispatching tenant created event");
            handler(tenant);
        }
    }

    /// Returns the number of registered creation handlers.
    #[must_use]
    pub fn created_handler_count(&self) -> usize {
        self.created.len()
    }
}

impl std::fmt::Debug for TenantEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantEvents")
            .field(
                "created",
                &self.created.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut events = TenantEvents::new();

        for label in ["provision", "notify", "audit"] {
            let order = Arc::clone(&order);
            events.on_created(label, move |_| order.lock().unwrap().push(label));
        }

        events.emit_created(&TenantId::new("acme").unwrap());
        assert_eq!(*order.lock().unwrap(), vec!["provision", "notify", "audit"]);
    }

    #[test]
    fn test_handler_receives_identity() {
        let seen = Arc::new(Mutex::new(None));
        let mut events = TenantEvents::new();
        {
            let seen = Arc::clone(&seen);
            events.on_created("capture", move |tenant| {
                *seen.lock().unwrap() = Some(tenant.clone());
            });
        }

        let tenant = TenantId::new("acme").unwrap();
        events.emit_created(&tenant);
        assert_eq!(seen.lock().unwrap().as_ref(), Some(&tenant));
    }

    #[test]
    fn test_empty_registry_is_a_noop() {
        let events = TenantEvents::new();
        assert_eq!(events.created_handler_count(), 0);
        events.emit_created(&TenantId::public());
    }
}

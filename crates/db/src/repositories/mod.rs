//! Repository abstractions for data access.

pub mod tenant;

pub use tenant::TenantRepository;

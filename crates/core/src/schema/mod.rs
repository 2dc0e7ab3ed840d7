//! Explicit declaration of the application schema.
//!
//! Instead of discovering tenant-scoped entities by walking a live type
//! hierarchy, applications declare every table once at startup into a
//! [`SchemaRegistry`]. The registry feeds both the consistency checks
//! ([`crate::check`]) and the policy synchronizer in `rowfence-db`.

pub mod declaration;
pub mod registry;

pub use declaration::{FieldDecl, FieldKind, ReferentialAction, TableDecl, TableScope, TenantRelation};
pub use registry::{RegistryError, SchemaRegistry, SchemaRegistryBuilder};

//! `SeaORM` entity definitions.

pub mod tenants;

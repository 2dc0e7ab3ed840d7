//! Core tenancy logic for Rowfence.
//!
//! This crate contains pure logic with ZERO web or database dependencies.
//! Everything that can be decided without a live PostgreSQL connection
//! lives here.
//!
//! # Modules
//!
//! - `tenant` - Tenant identity and creation events
//! - `schema` - Explicit registry of declared tables and fields
//! - `check` - Static consistency checks over the registry
//! - `policy` - Row-level-security DDL and session-setting vocabulary

pub mod check;
pub mod policy;
pub mod schema;
pub mod tenant;

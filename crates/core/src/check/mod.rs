//! Static consistency checks over the declared schema.
//!
//! Run at application startup or in CI, before any request touches the
//! database. Criticals abort startup; warnings are logged and non-blocking.

pub mod checker;
pub mod findings;

#[cfg(test)]
mod tests;

pub use checker::run_checks;
pub use findings::{CheckError, Finding, Severity, enforce};

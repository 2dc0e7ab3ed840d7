//! Check findings and enforcement.

use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Should be fixed, does not block startup.
    Warning,
    /// Misconfiguration that can leak data; blocks startup.
    Critical,
}

/// One finding produced by the checker.
///
/// The code is a stable identifier per rule so CI tooling can gate on
/// fatal-only or full strictness without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Severity of the finding.
    pub severity: Severity,
    /// Stable rule identifier, e.g. `tenant_field.C001`.
    pub code: &'static str,
    /// Table the finding refers to.
    pub table: String,
    /// Human-readable message.
    pub message: String,
    /// Optional remediation hint.
    pub hint: Option<String>,
}

impl Finding {
    /// Returns `true` for findings that must abort startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:?}] {} ({}): {}",
            self.severity, self.table, self.code, self.message
        )
    }
}

/// Error returned by [`enforce`] when critical findings exist.
#[derive(Debug, Error)]
#[error("schema consistency check failed with {critical_count} critical finding(s)")]
pub struct CheckError {
    /// Number of critical findings.
    pub critical_count: usize,
    /// The critical findings themselves.
    pub criticals: Vec<Finding>,
}

/// Logs every finding and fails if any is critical.
///
/// Warnings go to the log at WARN, criticals at ERROR. Intended to be called
/// from application startup right after building the registry.
///
/// # Errors
///
/// Returns [`CheckError`] carrying the critical findings, if any.
pub fn enforce(findings: &[Finding]) -> Result<(), CheckError> {
    for finding in findings {
        match finding.severity {
            Severity::Warning => warn!(
                code = finding.code,
                table = %finding.table,
                hint = finding.hint.as_deref().unwrap_or(""),
                "{}", finding.message
            ),
            Severity::Critical => error!(
                code = finding.code,
                table = %finding.table,
                "{}", finding.message
            ),
        }
    }

    let criticals: Vec<_> = findings.iter().filter(|f| f.is_fatal()).cloned().collect();
    if criticals.is_empty() {
        Ok(())
    } else {
        Err(CheckError {
            critical_count: criticals.len(),
            criticals,
        })
    }
}

//! Validated tenant identity.
//!
//! A tenant is identified by its schema name. The schema name is the RLS
//! discriminator value, so it is validated once at construction and treated
//! as immutable afterwards. Renaming a tenant that already owns rows is an
//! explicit migration, never a mutation of this type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema name of the distinguished public tenant.
///
/// The public tenant owns shared/administrative rows. It is a valid value of
/// the discriminator column, not a bypass of the policy.
pub const PUBLIC_SCHEMA_NAME: &str = "public";

/// PostgreSQL identifier length limit.
const MAX_SCHEMA_NAME_LEN: usize = 63;

/// Errors raised when constructing a [`TenantId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TenantIdError {
    /// Schema name is empty.
    #[error("tenant schema name is empty")]
    Empty,

    /// Schema name exceeds the PostgreSQL identifier limit.
    #[error("tenant schema name exceeds {MAX_SCHEMA_NAME_LEN} characters: {0}")]
    TooLong(String),

    /// Schema name contains characters outside `[a-z0-9_]`.
    #[error("tenant schema name contains invalid characters: {0:?}")]
    InvalidCharacters(String),
}

/// Immutable identity of a tenant.
///
/// Equality and hashing are by schema name. The name is guaranteed to be a
/// safe unquoted PostgreSQL identifier, which is what makes interpolating it
/// into `SET LOCAL` statements safe (see [`crate::policy`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId {
    schema_name: String,
}

impl TenantId {
    /// Creates a tenant identity from a schema name.
    ///
    /// # Errors
    ///
    /// Returns a [`TenantIdError`] if the name is empty, too long, or is not
    /// a lowercase identifier (`[a-z_][a-z0-9_]*`).
    pub fn new(schema_name: impl Into<String>) -> Result<Self, TenantIdError> {
        let schema_name = schema_name.into();

        if schema_name.is_empty() {
            return Err(TenantIdError::Empty);
        }
        if schema_name.len() > MAX_SCHEMA_NAME_LEN {
            return Err(TenantIdError::TooLong(schema_name));
        }

        let mut chars = schema_name.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let tail_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !head_ok || !tail_ok {
            return Err(TenantIdError::InvalidCharacters(schema_name));
        }

        Ok(Self { schema_name })
    }

    /// Returns the distinguished public tenant identity.
    #[must_use]
    pub fn public() -> Self {
        Self {
            schema_name: PUBLIC_SCHEMA_NAME.to_string(),
        }
    }

    /// Returns the schema name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.schema_name
    }

    /// Returns `true` if this is the public tenant.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.schema_name == PUBLIC_SCHEMA_NAME
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.schema_name)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("acme")]
    #[case("acme_corp")]
    #[case("_internal")]
    #[case("tenant42")]
    #[case("public")]
    fn test_valid_schema_names(#[case] name: &str) {
        let tenant = TenantId::new(name).expect("should be valid");
        assert_eq!(tenant.as_str(), name);
    }

    #[rstest]
    #[case("Acme")]
    #[case("42tenant")]
    #[case("acme corp")]
    #[case("acme-corp")]
    #[case("acme'; DROP TABLE tenants; --")]
    fn test_invalid_schema_names(#[case] name: &str) {
        assert!(matches!(
            TenantId::new(name),
            Err(TenantIdError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_empty_and_too_long() {
        assert_eq!(TenantId::new(""), Err(TenantIdError::Empty));
        let long = "a".repeat(64);
        assert!(matches!(TenantId::new(long), Err(TenantIdError::TooLong(_))));
        assert!(TenantId::new("a".repeat(63)).is_ok());
    }

    #[test]
    fn test_public_tenant() {
        let public = TenantId::public();
        assert!(public.is_public());
        assert_eq!(public.as_str(), PUBLIC_SCHEMA_NAME);
        assert!(!TenantId::new("acme").unwrap().is_public());
    }

    #[test]
    fn test_equality_by_schema_name() {
        assert_eq!(TenantId::new("acme").unwrap(), TenantId::new("acme").unwrap());
        assert_ne!(TenantId::new("acme").unwrap(), TenantId::new("emca").unwrap());
    }

    proptest! {
        /// Any accepted schema name contains only characters that are safe to
        /// interpolate unquoted into a SET statement.
        #[test]
        fn test_accepted_names_are_set_safe(name in "\\PC{0,80}") {
            if let Ok(tenant) = TenantId::new(name) {
                prop_assert!(tenant
                    .as_str()
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
                prop_assert!(!tenant.as_str().contains('\''));
                prop_assert!(tenant.as_str().len() <= 63);
            }
        }
    }
}

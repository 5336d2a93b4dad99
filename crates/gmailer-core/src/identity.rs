//! Mailbox identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity used when a caller does not name one.
pub const DEFAULT_IDENTITY: &str = "gmail-credentials";

/// Key naming the stored credential of one mailbox.
///
/// Identities are never blank and always lower-case; build them with
/// [`Identity::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Normalises a caller-supplied identity.
    ///
    /// The input is trimmed; a missing or blank value resolves to
    /// [`DEFAULT_IDENTITY`], anything else is lower-cased.
    #[must_use]
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if !s.is_empty() => Self(s.to_lowercase()),
            _ => Self::default(),
        }
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the default identity.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_IDENTITY
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self(DEFAULT_IDENTITY.to_string())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_and_blank_resolve_to_default() {
        assert_eq!(Identity::resolve(None).as_str(), DEFAULT_IDENTITY);
        assert_eq!(Identity::resolve(Some("")).as_str(), DEFAULT_IDENTITY);
        assert!(Identity::resolve(Some(" \t ")).is_default());
    }

    #[test]
    fn test_identity_is_lower_cased() {
        let identity = Identity::resolve(Some("Monash.Inbox@Example.com"));
        assert_eq!(identity.as_str(), "monash.inbox@example.com");
        assert!(!identity.is_default());
    }

    #[test]
    fn test_identity_is_trimmed() {
        assert_eq!(Identity::resolve(Some("  Sales ")).as_str(), "sales");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let identity = Identity::resolve(Some("sales"));
        assert_eq!(serde_json::to_string(&identity).unwrap(), "\"sales\"");
    }

    proptest! {
        #[test]
        fn test_resolved_identity_is_never_blank(raw in "\\PC{0,40}") {
            let identity = Identity::resolve(Some(raw.as_str()));
            prop_assert!(!identity.as_str().trim().is_empty());
            prop_assert_eq!(identity.as_str().to_lowercase(), identity.as_str());
        }
    }
}

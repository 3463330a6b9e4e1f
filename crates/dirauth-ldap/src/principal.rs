//! Normalized principal identity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Access tier assigned by classification.
///
/// An unauthorized principal is never represented as a value of this type:
/// classification returns no principal at all in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessTier {
    /// Elevated access.
    Admin,
    /// Baseline access.
    Member,
}

/// Normalized identity produced by classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque identifier: the entry's distinguished name.
    pub id: String,
    /// Login name (first `samaccountname` value).
    pub username: String,
    /// Assigned access tier.
    pub tier: AccessTier,
    /// Name of the matched group, or empty when none applies (owner grants
    /// and group-free configurations).
    pub group: String,
    /// Copy of the fetched raw attributes, for callers that need more than
    /// the normalized fields (e.g. a remember-token seed).
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

impl Principal {
    /// Returns true if the principal holds the elevated tier.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.tier == AccessTier::Admin
    }

    /// Returns the first value of a raw attribute if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_accessors() {
        let principal = Principal {
            id: "CN=jsmith,DC=corp".to_string(),
            username: "jsmith".to_string(),
            tier: AccessTier::Admin,
            group: "IT".to_string(),
            attributes: HashMap::from([(
                "mail".to_string(),
                vec!["jsmith@corp.example.com".to_string()],
            )]),
        };
        assert!(principal.is_admin());
        assert_eq!(principal.attribute("mail"), Some("jsmith@corp.example.com"));
        assert_eq!(principal.attribute("phone"), None);
    }
}

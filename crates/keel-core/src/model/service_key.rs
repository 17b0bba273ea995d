//! Service identifiers

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier the container can resolve to a service instance
///
/// Keys are plain strings on the wire. Abstract capability names
/// (`orm::EntityManagerInterface`) and concrete keys
/// (`doctrine.entity_manager.orm_default`) share this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceKey(String);

impl ServiceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Render a `%s` key template (e.g. `doctrine.connection.%s`) for a name
    pub fn from_pattern(pattern: &str, name: &str) -> Self {
        Self(pattern.replacen("%s", name, 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after `prefix`, if the key starts with it
    ///
    /// `doctrine.connection.replica` with prefix `doctrine.connection.`
    /// yields `replica`.
    pub fn strip_namespace<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        self.0.strip_prefix(prefix).filter(|rest| !rest.is_empty())
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ServiceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pattern() {
        let key = ServiceKey::from_pattern("doctrine.entity_manager.%s", "orm_default");
        assert_eq!(key.as_str(), "doctrine.entity_manager.orm_default");
    }

    #[test]
    fn test_strip_namespace() {
        let key = ServiceKey::new("doctrine.connection.replica");
        assert_eq!(key.strip_namespace("doctrine.connection."), Some("replica"));
        assert_eq!(key.strip_namespace("doctrine.entity_manager."), None);
        assert_eq!(
            ServiceKey::new("doctrine.connection.").strip_namespace("doctrine.connection."),
            None
        );
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = ServiceKey::new("a.b");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"a.b\"");
    }

    #[test]
    fn test_borrow_allows_str_lookup() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ServiceKey::new("k"), 1);
        assert_eq!(map.get("k"), Some(&1));
    }
}

//! Redacting wrapper for secrets carried in configuration
//!
//! Database passwords parse from settings like any other value but never
//! reach logs, error messages or a dumped configuration.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Placeholder written wherever a sensitive value would appear
pub const REDACTED: &str = "***REDACTED***";

/// A value whose Debug, Display and Serialize output is [`REDACTED`]
///
/// ```
/// use keel_core_types::Sensitive;
///
/// let password = Sensitive::new("secret123");
/// assert_eq!(format!("{:?}", password), "***REDACTED***");
/// assert_eq!(password.expose(), &"secret123");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// The secret itself; only for handing to a driver
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

// Deserialization is transparent so secrets load from settings files.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct ConnectionParams {
        user: String,
        password: Option<Sensitive<String>>,
    }

    fn params() -> ConnectionParams {
        serde_json::from_str(r#"{"user": "app", "password": "hunter2"}"#).unwrap()
    }

    #[test]
    fn test_password_loads_from_settings() {
        let params = params();
        assert_eq!(
            params.password.as_ref().map(|p| p.expose().as_str()),
            Some("hunter2")
        );
    }

    #[test]
    fn test_debug_and_display_hide_password() {
        let params = params();
        let debug = format!("{:?}", params);
        assert!(debug.contains("app"));
        assert!(debug.contains(REDACTED));
        assert!(!debug.contains("hunter2"));

        let password = params.password.unwrap();
        assert_eq!(password.to_string(), REDACTED);
    }

    #[test]
    fn test_dumped_settings_are_redacted() {
        let dumped = serde_json::to_value(params()).unwrap();
        assert_eq!(dumped["password"], REDACTED);
        assert_eq!(dumped["user"], "app");
    }

    #[test]
    fn test_equality_compares_secrets() {
        assert_eq!(Sensitive::new("a"), Sensitive::from("a"));
        assert_ne!(Sensitive::new("a"), Sensitive::new("b"));
        assert_eq!(Sensitive::<String>::default().into_inner(), "");
    }
}

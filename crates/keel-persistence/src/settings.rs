//! Typed view of the `doctrine` settings section

use std::collections::BTreeMap;
use std::path::PathBuf;

use keel_core::MergedConfig;
use keel_core_types::sensitive::REDACTED;
use keel_core_types::Sensitive;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{invalid_settings, Result};
use crate::identifiers::ARRAY_CACHE;

/// Top-level settings section read by the persistence collaborators
pub const SETTINGS_SECTION: &str = "doctrine";

/// Driver used when connection params name none
pub const DEFAULT_DRIVER: &str = "sqlite";

/// Driver names served by the SQLite backend
pub const SQLITE_DRIVERS: [&str; 3] = ["sqlite", "sqlite3", "pdo_sqlite"];

/// Keys whose values never leave the process unredacted
const SECRET_KEYS: [&str; 2] = ["password", "url"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctrineSettings {
    /// Connection name -> connection params
    #[serde(default)]
    pub connection: BTreeMap<String, ConnectionParams>,

    /// Connection name -> mapping driver settings
    #[serde(default)]
    pub driver: BTreeMap<String, DriverSettings>,
}

/// Parameters for one named connection
///
/// An empty mapping means the host has not configured the connection yet.
/// Unknown keys are rejected rather than ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// Database file for file-backed drivers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub memory: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Sensitive<String>>,

    /// DSN such as `sqlite:///var/app.db`; overrides `driver`, `path` and
    /// `memory`. May embed credentials, so it is kept redacted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Sensitive<String>>,
}

impl ConnectionParams {
    pub fn is_configured(&self) -> bool {
        *self != Self::default()
    }

    pub fn driver(&self) -> &str {
        self.driver.as_deref().unwrap_or(DEFAULT_DRIVER)
    }

    /// Params with `url` folded into `driver`, `path` and `memory`
    ///
    /// `sqlite:///relative.db`, `sqlite:////absolute.db` and
    /// `sqlite:///:memory:` are understood; any other scheme becomes the
    /// driver name so the driver check can reject it.
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_INPUT` at `doctrine.connection.<name>.url` when the DSN
    /// has no scheme or no database. The DSN itself is never echoed.
    pub fn resolve_url(&self, name: &str) -> Result<Self> {
        let Some(url) = &self.url else {
            return Ok(self.clone());
        };
        let field = format!("{}.connection.{}.url", SETTINGS_SECTION, name);
        let (scheme, rest) = url
            .expose()
            .split_once("://")
            .ok_or_else(|| invalid_settings(&field, "expected `<driver>://...`"))?;

        let mut resolved = Self {
            url: None,
            driver: Some(scheme.replace('-', "_")),
            ..self.clone()
        };
        if !SQLITE_DRIVERS.contains(&resolved.driver()) {
            return Ok(resolved);
        }

        // The authority is empty for sqlite; what follows its `/` is the file.
        let database = rest.strip_prefix('/').unwrap_or(rest);
        match database {
            "" => return Err(invalid_settings(&field, "sqlite DSN names no database")),
            ":memory:" => {
                resolved.memory = true;
                resolved.path = None;
            }
            file => {
                resolved.memory = false;
                resolved.path = Some(PathBuf::from(file));
            }
        }
        Ok(resolved)
    }

    /// SQLite-only parameters for tests and local tooling
    pub fn sqlite_memory() -> Self {
        Self {
            driver: Some(DEFAULT_DRIVER.to_string()),
            memory: true,
            ..Self::default()
        }
    }
}

/// Mapping driver settings for one connection name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverSettings {
    pub class: String,

    #[serde(default = "default_cache")]
    pub cache: String,

    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

fn default_cache() -> String {
    ARRAY_CACHE.to_string()
}

impl DoctrineSettings {
    /// Read the `doctrine` section; a missing section yields empty settings
    ///
    /// Keys other than `connection` and `driver` belong to collaborators
    /// and are left alone.
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_INPUT` naming the offending entry, e.g.
    /// `doctrine.connection.orm_default`, when it does not have the expected
    /// shape or carries an unknown key.
    pub fn from_config(config: &MergedConfig) -> Result<Self> {
        let section = match config.section(SETTINGS_SECTION) {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(section)) => section,
            Some(_) => return Err(invalid_settings(SETTINGS_SECTION, "expected a mapping")),
        };
        Ok(Self {
            connection: entries(section, "connection")?,
            driver: entries(section, "driver")?,
        })
    }

    /// Params for `name`; unconfigured connections yield empty params
    pub fn connection(&self, name: &str) -> ConnectionParams {
        self.connection.get(name).cloned().unwrap_or_default()
    }

    pub fn driver(&self, name: &str) -> Option<&DriverSettings> {
        self.driver.get(name)
    }
}

/// Parse every entry of `doctrine.<group>` on its own so errors name it
fn entries<T: DeserializeOwned>(
    section: &Map<String, Value>,
    group: &str,
) -> Result<BTreeMap<String, T>> {
    let path = format!("{}.{}", SETTINGS_SECTION, group);
    match section.get(group) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| {
                serde_json::from_value(value.clone())
                    .map(|parsed| (name.clone(), parsed))
                    .map_err(|e| invalid_settings(&format!("{}.{}", path, name), e.to_string()))
            })
            .collect(),
        Some(_) => Err(invalid_settings(&path, "expected a mapping")),
    }
}

/// Copy of a settings tree with secret values replaced
pub fn redacted(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let inner = if SECRET_KEYS.contains(&key.as_str()) && !inner.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redacted(inner)
                    };
                    (key.clone(), inner)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redacted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEFAULT_CONNECTION_NAME: &str = "orm_default";

    #[test]
    fn test_empty_params_are_not_configured() {
        let params: ConnectionParams = serde_json::from_value(json!({})).unwrap();
        assert!(!params.is_configured());
        assert_eq!(params.driver(), "sqlite");
    }

    #[test]
    fn test_password_is_redacted_when_serialized() {
        let params: ConnectionParams = serde_json::from_value(json!({
            "driver": "pgsql",
            "user": "app",
            "password": "hunter2"
        }))
        .unwrap();

        assert!(params.is_configured());
        assert_eq!(
            params.password.as_ref().map(|p| p.expose().as_str()),
            Some("hunter2")
        );
        let rendered = serde_json::to_value(&params).unwrap();
        assert_eq!(rendered["password"], json!(REDACTED));
    }

    #[test]
    fn test_driver_defaults() {
        let driver: DriverSettings =
            serde_json::from_value(json!({"class": "orm::mapping::SimplifiedYamlDriver"}))
                .unwrap();
        assert_eq!(driver.cache, "array");
        assert!(driver.paths.is_empty());
    }

    fn settings(doctrine: Value) -> Result<DoctrineSettings> {
        let merged = keel_core::Aggregator::default()
            .with_provider(keel_core::StaticProvider::new(
                "test",
                keel_core::ConfigFragment::new().setting(SETTINGS_SECTION, doctrine),
            ))
            .aggregate()
            .unwrap();
        DoctrineSettings::from_config(&merged)
    }

    #[test]
    fn test_unknown_connection_key_names_the_connection() {
        let err = settings(json!({"connection": {"orm_default": {"pth": "/tmp/app.db"}}}))
            .unwrap_err();
        assert_eq!(err.kind(), keel_core::ExErrorKind::InvalidInput);
        assert_eq!(err.service_key(), Some("doctrine.connection.orm_default"));
        assert!(err.message().contains("pth"), "{}", err.message());
    }

    #[test]
    fn test_unknown_driver_key_names_the_driver() {
        let err = settings(json!({"driver": {"orm_default": {"class": "x", "chache": "array"}}}))
            .unwrap_err();
        assert_eq!(err.service_key(), Some("doctrine.driver.orm_default"));
    }

    #[test]
    fn test_other_doctrine_keys_are_left_alone() {
        let parsed = settings(json!({
            "connection": {"orm_default": {}},
            "migrations": {"table": "versions"}
        }))
        .unwrap();
        assert!(!parsed.connection(DEFAULT_CONNECTION_NAME).is_configured());
    }

    #[test]
    fn test_sqlite_url_resolves_to_path() {
        let params: ConnectionParams =
            serde_json::from_value(json!({"url": "sqlite:////var/lib/app.db"})).unwrap();
        assert!(params.is_configured());

        let resolved = params.resolve_url("orm_default").unwrap();
        assert_eq!(resolved.driver(), "sqlite");
        assert_eq!(resolved.path, Some(PathBuf::from("/var/lib/app.db")));
        assert!(resolved.url.is_none());
    }

    #[test]
    fn test_sqlite_memory_url() {
        let params = ConnectionParams {
            url: Some(Sensitive::new("pdo-sqlite:///:memory:".to_string())),
            path: Some(PathBuf::from("ignored.db")),
            ..ConnectionParams::default()
        };
        let resolved = params.resolve_url("orm_default").unwrap();
        assert_eq!(resolved.driver(), "pdo_sqlite");
        assert!(resolved.memory);
        assert_eq!(resolved.path, None);
    }

    #[test]
    fn test_other_schemes_become_the_driver() {
        let params = ConnectionParams {
            url: Some(Sensitive::new("mysql://app:hunter2@db/app".to_string())),
            ..ConnectionParams::default()
        };
        assert_eq!(params.resolve_url("orm_default").unwrap().driver(), "mysql");
    }

    #[test]
    fn test_malformed_url_is_rejected_without_echo() {
        let params = ConnectionParams {
            url: Some(Sensitive::new("hunter2".to_string())),
            ..ConnectionParams::default()
        };
        let err = params.resolve_url("replica").unwrap_err();
        assert_eq!(err.service_key(), Some("doctrine.connection.replica.url"));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_redacted_walks_nested_maps() {
        let value = json!({
            "connection": {"orm_default": {"user": "app", "password": "hunter2"}},
            "list": [{"url": "sqlite:///tmp/x"}]
        });
        let clean = redacted(&value);
        assert_eq!(clean["connection"]["orm_default"]["password"], json!(REDACTED));
        assert_eq!(clean["connection"]["orm_default"]["user"], json!("app"));
        assert_eq!(clean["list"][0]["url"], json!(REDACTED));
    }
}

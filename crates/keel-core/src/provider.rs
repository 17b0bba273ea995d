//! Configuration providers
//!
//! A provider contributes one [`ConfigFragment`]. Providers must be pure:
//! the host may invoke them more than once (cache warming, `config check`)
//! and expects identical output every time.

use std::path::Path;

use serde_json::Value;

use crate::errors::{KeelError, Result};
use crate::model::ConfigFragment;

/// A named contribution to the application configuration
pub trait ConfigProvider {
    /// Stable name used in provenance and conflict reports
    fn name(&self) -> &str;

    /// Produce the fragment; no I/O, no environment reads
    fn provide(&self) -> ConfigFragment;
}

/// Provider wrapping a fragment built ahead of time
///
/// Used for configuration files, environment layers and tests. Any I/O
/// happens when the provider is constructed, never in `provide`.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    name: String,
    fragment: ConfigFragment,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, fragment: ConfigFragment) -> Self {
        Self {
            name: name.into(),
            fragment,
        }
    }

    /// Load a fragment from a `.json`, `.toml`, `.yaml` or `.yml` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| KeelError::Io {
            message: format!("cannot read {}: {}", name, e),
        })?;

        let invalid = |reason: String| KeelError::InvalidFragment {
            provider: name.clone(),
            reason,
        };

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let value: Value = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?,
            Some("toml") => toml::from_str(&content).map_err(|e| invalid(e.to_string()))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?
            }
            _ => {
                return Err(invalid(
                    "unsupported file extension (expected json, toml, yaml or yml)".to_string(),
                )
                .into())
            }
        };

        let fragment = ConfigFragment::from_value(&name, value)?;
        tracing::debug!(provider = %name, "loaded configuration file");
        Ok(Self::new(name, fragment))
    }
}

impl ConfigProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn provide(&self) -> ConfigFragment {
        self.fragment.clone()
    }
}

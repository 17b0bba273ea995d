//! Configuration fragment contributed by one provider
//!
//! A fragment is the typed form of the nested mapping:
//!
//! ```text
//! factories:   ServiceKey -> FactoryBinding
//! services:    identifier -> ServiceKey      (identity entry = self-registration)
//! delegators:  ServiceKey -> [decorator factory, ...]
//! console:     commands: name -> handler id
//!              services: handler id -> handler id
//! <section>:   free-form settings tree (e.g. `doctrine`)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ExError, KeelError, Result};
use crate::model::{DelegatorChain, FactoryBinding, ServiceKey};

/// Section names with registration semantics; everything else is settings
pub const RESERVED_SECTIONS: [&str; 4] = ["factories", "services", "delegators", "console"];

/// One provider's contribution to the application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFragment {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub factories: BTreeMap<ServiceKey, FactoryBinding>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<ServiceKey, ServiceKey>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub delegators: BTreeMap<ServiceKey, DelegatorChain>,

    #[serde(default, skip_serializing_if = "ConsoleSection::is_empty")]
    pub console: ConsoleSection,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// Console command table contribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleSection {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<ServiceKey, ServiceKey>,
}

impl ConsoleSection {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.services.is_empty()
    }

    /// Bind `name` to `handler` and register the handler class as a service
    /// under its own identifier
    pub fn register_command(&mut self, name: impl Into<String>, handler: &str) {
        self.commands.insert(name.into(), handler.to_string());
        self.services
            .insert(ServiceKey::new(handler), ServiceKey::new(handler));
    }
}

impl ConfigFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain constructor for `key`
    pub fn factory(mut self, key: impl Into<ServiceKey>, constructor: &str) -> Self {
        self.factories
            .insert(key.into(), FactoryBinding::Constructor(constructor.to_string()));
        self
    }

    /// Register a constructor that receives `argument` (e.g. a connection name)
    pub fn parameterized_factory(
        mut self,
        key: impl Into<ServiceKey>,
        constructor: &str,
        argument: &str,
    ) -> Self {
        self.factories.insert(
            key.into(),
            FactoryBinding::Parameterized(constructor.to_string(), argument.to_string()),
        );
        self
    }

    /// Point an abstract identifier at the key that satisfies it
    pub fn alias(mut self, id: impl Into<ServiceKey>, target: impl Into<ServiceKey>) -> Self {
        self.services.insert(id.into(), target.into());
        self
    }

    /// Register a class as injectable under its own identifier
    pub fn invokable(mut self, class: &str) -> Self {
        self.services
            .insert(ServiceKey::new(class), ServiceKey::new(class));
        self
    }

    /// Append a decorator factory to the chain of `key`
    pub fn delegator(mut self, key: impl Into<ServiceKey>, factory: &str) -> Self {
        self.delegators
            .entry(key.into())
            .or_default()
            .push(factory.to_string());
        self
    }

    /// Bind a console command and self-register its handler
    pub fn command(mut self, name: &str, handler: &str) -> Self {
        self.console.register_command(name, handler);
        self
    }

    /// Set a top-level settings section
    ///
    /// # Panics
    ///
    /// In debug builds, when `section` names a registration section
    /// (`factories`, `services`, ...). Release builds log and skip it.
    pub fn setting(mut self, section: &str, value: Value) -> Self {
        debug_assert!(
            !RESERVED_SECTIONS.contains(&section),
            "`{}` is a registration section, not a settings section",
            section
        );
        if RESERVED_SECTIONS.contains(&section) {
            tracing::warn!(section, "ignoring settings section with a reserved name");
            return self;
        }
        self.settings.insert(section.to_string(), value);
        self
    }

    /// Whether `services` registers `id` as itself
    pub fn is_identity(&self, id: &str) -> bool {
        self.services
            .get(id)
            .map(|target| target.as_str() == id)
            .unwrap_or(false)
    }

    /// Render the nested mapping
    pub fn to_value(&self) -> Value {
        // Every map is keyed by a string, so serialization cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Parse a nested mapping contributed by `provider`
    pub fn from_value(provider: &str, value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(KeelError::InvalidFragment {
                provider: provider.to_string(),
                reason: "top level must be a mapping".to_string(),
            }
            .into());
        }

        serde_json::from_value(value).map_err(|e| {
            ExError::from(KeelError::InvalidFragment {
                provider: provider.to_string(),
                reason: e.to_string(),
            })
        })
    }
}

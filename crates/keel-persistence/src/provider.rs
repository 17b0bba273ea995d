//! Persistence configuration provider
//!
//! Declares the connection, entity manager and console wiring for the
//! persistence layer, plus default `doctrine` settings. Pure: no I/O, no
//! environment reads, identical output on every call.

use keel_core::errors::{render_pattern, SERVICE_NOT_CONFIGURED_PATTERN};
use keel_core::{ConfigFragment, ConfigProvider, ServiceKey};
use serde_json::json;

use crate::identifiers::{
    ARRAY_CACHE, COMMANDS, CONNECTION, CONNECTION_FACTORY, CONSOLE, CONSOLE_DELEGATOR_FACTORY,
    ENTITY_MANAGER_FACTORY, ENTITY_MANAGER_INTERFACE, SIMPLIFIED_YAML_DRIVER,
};

/// Service key template of the entity manager for a connection name
pub const CONNECTION_ALIAS_PATTERN: &str = "doctrine.entity_manager.%s";

/// Service key template of the connection for a connection name
pub const CONNECTION_KEY_PATTERN: &str = "doctrine.connection.%s";

/// Connection name used when none is given
pub const DEFAULT_CONNECTION: &str = "orm_default";

/// Message template for an identifier the container cannot build
pub const CONTAINER_EXCEPTION_MESSAGE_PATTERN: &str = SERVICE_NOT_CONFIGURED_PATTERN;

/// `doctrine.entity_manager.<name>`
pub fn entity_manager_key(name: &str) -> ServiceKey {
    ServiceKey::from_pattern(CONNECTION_ALIAS_PATTERN, name)
}

/// `doctrine.connection.<name>`
pub fn connection_key(name: &str) -> ServiceKey {
    ServiceKey::from_pattern(CONNECTION_KEY_PATTERN, name)
}

/// Render the container error message for `id`
pub fn container_exception_message(id: &str) -> String {
    render_pattern(CONTAINER_EXCEPTION_MESSAGE_PATTERN, id)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PersistenceConfigProvider;

impl PersistenceConfigProvider {
    pub const NAME: &'static str = "persistence";
}

impl ConfigProvider for PersistenceConfigProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn provide(&self) -> ConfigFragment {
        let fragment = ConfigFragment::new()
            .factory(
                entity_manager_key(DEFAULT_CONNECTION),
                ENTITY_MANAGER_FACTORY,
            )
            .parameterized_factory(
                connection_key(DEFAULT_CONNECTION),
                CONNECTION_FACTORY,
                DEFAULT_CONNECTION,
            )
            .alias(
                ENTITY_MANAGER_INTERFACE,
                entity_manager_key(DEFAULT_CONNECTION),
            )
            .alias(CONNECTION, connection_key(DEFAULT_CONNECTION))
            .delegator(CONSOLE, CONSOLE_DELEGATOR_FACTORY);

        let fragment = COMMANDS
            .iter()
            .fold(fragment, |fragment, (name, handler)| {
                fragment.command(name, handler)
            });

        fragment.setting(
            "doctrine",
            json!({
                "connection": {
                    DEFAULT_CONNECTION: {}
                },
                "driver": {
                    DEFAULT_CONNECTION: {
                        "class": SIMPLIFIED_YAML_DRIVER,
                        "cache": ARRAY_CACHE,
                        "paths": []
                    }
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_helpers() {
        assert_eq!(
            entity_manager_key(DEFAULT_CONNECTION).as_str(),
            "doctrine.entity_manager.orm_default"
        );
        assert_eq!(
            connection_key("replica").as_str(),
            "doctrine.connection.replica"
        );
    }

    #[test]
    fn test_container_exception_message() {
        assert_eq!(
            container_exception_message(CONNECTION),
            "The `dbal::Connection` class must be configured in the DI container."
        );
    }

    #[test]
    fn test_provide_is_deterministic() {
        let provider = PersistenceConfigProvider;
        assert_eq!(
            provider.provide().to_value().to_string(),
            provider.provide().to_value().to_string()
        );
    }

    #[test]
    fn test_console_services_are_identity_registrations() {
        let fragment = PersistenceConfigProvider.provide();
        assert_eq!(fragment.console.services.len(), COMMANDS.len());
        for (id, target) in &fragment.console.services {
            assert_eq!(id, target);
        }
    }
}

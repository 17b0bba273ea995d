#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use keel_core::container::Registration;
use keel_core::errors::ExErrorKind;
use keel_core::{ConfigFragment, ConfigProvider, ConflictPolicy, FactoryBinding};
use keel_persistence::identifiers::{
    COMMANDS, CONNECTION, CONNECTION_FACTORY, CONSOLE, CONSOLE_DELEGATOR_FACTORY,
    ENTITY_MANAGER_FACTORY, ENTITY_MANAGER_INTERFACE, INFO_COMMAND,
};
use keel_persistence::settings::DoctrineSettings;
use keel_persistence::{
    PersistenceConfigProvider, CONNECTION_ALIAS_PATTERN, CONTAINER_EXCEPTION_MESSAGE_PATTERN,
    DEFAULT_CONNECTION,
};
use serde_json::json;

#[test]
fn test_public_constants() {
    assert_eq!(CONNECTION_ALIAS_PATTERN, "doctrine.entity_manager.%s");
    assert_eq!(DEFAULT_CONNECTION, "orm_default");
    assert_eq!(
        CONTAINER_EXCEPTION_MESSAGE_PATTERN,
        "The `%s` class must be configured in the DI container."
    );
}

#[test]
fn test_fragment_sections() {
    let value = PersistenceConfigProvider.provide().to_value();

    assert_eq!(
        value["factories"],
        json!({
            "doctrine.connection.orm_default": [CONNECTION_FACTORY, "orm_default"],
            "doctrine.entity_manager.orm_default": ENTITY_MANAGER_FACTORY
        })
    );
    assert_eq!(
        value["services"],
        json!({
            CONNECTION: "doctrine.connection.orm_default",
            ENTITY_MANAGER_INTERFACE: "doctrine.entity_manager.orm_default"
        })
    );
    assert_eq!(value["delegators"], json!({ CONSOLE: [CONSOLE_DELEGATOR_FACTORY] }));
    assert_eq!(
        value["console"]["commands"].as_object().map(|m| m.len()),
        Some(28)
    );
}

#[test]
fn test_repeated_aggregation_is_byte_identical() {
    let first = common::merged(Vec::new(), ConflictPolicy::Reject).unwrap();
    let second = common::merged(Vec::new(), ConflictPolicy::Reject).unwrap();

    assert_eq!(first.digest(), second.digest());
    assert_eq!(first.to_value().to_string(), second.to_value().to_string());
}

#[test]
fn test_every_command_handler_is_self_registered() {
    let merged = common::merged(Vec::new(), ConflictPolicy::Reject).unwrap();

    assert_eq!(merged.commands().len(), COMMANDS.len());
    for (name, handler) in COMMANDS {
        assert_eq!(merged.commands().get(name).map(String::as_str), Some(handler));
        assert_eq!(
            merged.service_target(handler).map(|k| k.as_str()),
            Some(handler),
            "{} must be registered under its own identifier",
            handler
        );
    }
    assert!(merged.validate().is_empty(), "{:?}", merged.validate());
}

#[test]
fn test_default_settings() {
    let merged = common::merged(Vec::new(), ConflictPolicy::Reject).unwrap();
    let settings = DoctrineSettings::from_config(&merged).unwrap();

    assert!(!settings.connection(DEFAULT_CONNECTION).is_configured());
    assert_eq!(merged.setting("doctrine.connection.orm_default"), Some(&json!({})));

    let driver = settings.driver(DEFAULT_CONNECTION).unwrap();
    assert_eq!(driver.class, "orm::mapping::SimplifiedYamlDriver");
    assert_eq!(driver.cache, "array");
    assert!(driver.paths.is_empty());
}

#[test]
fn test_alias_leads_to_factory() {
    let container = common::container(Vec::new());

    let em = container.describe(ENTITY_MANAGER_INTERFACE).unwrap();
    assert_eq!(em.key.as_str(), "doctrine.entity_manager.orm_default");
    assert_eq!(
        em.registration,
        Registration::Factory {
            binding: FactoryBinding::Constructor(ENTITY_MANAGER_FACTORY.to_string())
        }
    );

    let conn = container.describe(CONNECTION).unwrap();
    assert_eq!(conn.key.as_str(), "doctrine.connection.orm_default");
    assert_eq!(
        conn.registration,
        Registration::Factory {
            binding: FactoryBinding::Parameterized(
                CONNECTION_FACTORY.to_string(),
                DEFAULT_CONNECTION.to_string()
            )
        }
    );

    let console = container.describe(CONSOLE).unwrap();
    assert_eq!(console.delegators, vec![CONSOLE_DELEGATOR_FACTORY.to_string()]);
}

#[test]
fn test_second_provider_binding_orm_info_is_rejected() {
    let overlay = ConfigFragment::new().command("orm:info", "app::command::InfoCommand");

    let err = common::merged(vec![overlay], ConflictPolicy::Reject).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::DuplicateMapping);
    assert_eq!(err.service_key(), Some("orm:info"));
    assert_eq!(
        err.candidates(),
        Some(&["persistence".to_string(), "overlay-0".to_string()][..])
    );
}

#[test]
fn test_last_wins_rebinds_orm_info() {
    let overlay = ConfigFragment::new().command("orm:info", "app::command::InfoCommand");

    let merged = common::merged(vec![overlay], ConflictPolicy::LastWins).unwrap();

    assert_eq!(
        merged.commands().get("orm:info").map(String::as_str),
        Some("app::command::InfoCommand")
    );
    assert!(merged.is_registered(INFO_COMMAND));
}

#[test]
fn test_host_overrides_connection_params() {
    let overlay = ConfigFragment::new().setting(
        "doctrine",
        json!({"connection": {"orm_default": {"driver": "sqlite", "memory": true}}}),
    );

    let merged = common::merged(vec![overlay], ConflictPolicy::Reject).unwrap();
    let settings = DoctrineSettings::from_config(&merged).unwrap();

    assert!(settings.connection(DEFAULT_CONNECTION).is_configured());
    // the driver defaults survive the overlay
    assert_eq!(settings.driver(DEFAULT_CONNECTION).unwrap().cache, "array");
}

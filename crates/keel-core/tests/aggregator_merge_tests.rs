#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;

use keel_core::aggregator::IssueKind;
use keel_core::errors::ExErrorKind;
use keel_core::{Aggregator, ConfigFragment, ConflictPolicy, StaticProvider};
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_file_layers_override_default_settings() {
    let dir = TempDir::new().unwrap();
    let yaml = write(
        &dir,
        "local.yaml",
        "doctrine:\n  connection:\n    orm_default:\n      driver: sqlite\n      memory: true\n",
    );
    let toml = write(
        &dir,
        "paths.toml",
        "[doctrine.driver.orm_default]\npaths = [\"config/orm\"]\n",
    );

    let defaults = ConfigFragment::new().setting(
        "doctrine",
        json!({
            "connection": {"orm_default": {}},
            "driver": {"orm_default": {"cache": "array", "paths": []}}
        }),
    );

    let merged = Aggregator::default()
        .with_provider(StaticProvider::new("defaults", defaults))
        .with_provider(StaticProvider::from_file(&yaml).unwrap())
        .with_provider(StaticProvider::from_file(&toml).unwrap())
        .aggregate()
        .unwrap();

    assert_eq!(
        merged.setting("doctrine.connection.orm_default"),
        Some(&json!({"driver": "sqlite", "memory": true}))
    );
    assert_eq!(
        merged.setting("doctrine.driver.orm_default"),
        Some(&json!({"cache": "array", "paths": ["config/orm"]}))
    );
    assert_eq!(merged.providers().len(), 3);
}

#[test]
fn test_json_file_contributes_registrations() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "app.json",
        r#"{
            "factories": {"app.mailer": "app::MailerFactory"},
            "services": {"app::Mailer": "app.mailer"},
            "delegators": {"app.mailer": ["app::LoggingMailer"]}
        }"#,
    );

    let merged = Aggregator::default()
        .with_provider(StaticProvider::from_file(&path).unwrap())
        .aggregate()
        .unwrap();

    assert_eq!(
        merged.factory("app.mailer").map(|b| b.constructor()),
        Some("app::MailerFactory")
    );
    assert_eq!(merged.delegators("app.mailer"), &["app::LoggingMailer"]);
    assert!(merged.validate().is_empty());
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "app.ini", "[x]\n");

    let err = StaticProvider::from_file(&path).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = StaticProvider::from_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Io);
}

#[test]
fn test_command_collision_names_both_providers() {
    let first = ConfigFragment::new().command("orm:info", "orm::command::InfoCommand");
    let second = ConfigFragment::new().command("orm:info", "app::InfoCommand");

    let err = Aggregator::default()
        .with_provider(StaticProvider::new("persistence", first))
        .with_provider(StaticProvider::new("app", second))
        .aggregate()
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::DuplicateMapping);
    assert_eq!(err.provider(), Some("app"));
    assert!(err.message().contains("persistence"));
}

#[test]
fn test_last_wins_command_override() {
    let first = ConfigFragment::new().command("orm:info", "orm::command::InfoCommand");
    let second = ConfigFragment::new().command("orm:info", "app::InfoCommand");

    let merged = Aggregator::new(ConflictPolicy::LastWins)
        .with_provider(StaticProvider::new("persistence", first))
        .with_provider(StaticProvider::new("app", second))
        .aggregate()
        .unwrap();

    assert_eq!(
        merged.commands().get("orm:info").map(String::as_str),
        Some("app::InfoCommand")
    );
    assert_eq!(merged.origin_of_command("orm:info"), Some("app"));
    // both handlers stay registered; only the name binding moved
    assert!(merged.is_registered("orm::command::InfoCommand"));
    assert!(merged.is_registered("app::InfoCommand"));
}

#[test]
fn test_null_layer_does_not_erase_defaults() {
    let merged = Aggregator::default()
        .with_provider(StaticProvider::new(
            "defaults",
            ConfigFragment::new().setting("app", json!({"name": "keel", "debug": false})),
        ))
        .with_provider(StaticProvider::new(
            "local",
            ConfigFragment::new().setting("app", json!({"name": null, "debug": true})),
        ))
        .aggregate()
        .unwrap();

    assert_eq!(merged.section("app"), Some(&json!({"name": "keel", "debug": true})));
}

#[test]
fn test_validate_flags_command_without_handler_registration() {
    let mut fragment = ConfigFragment::new();
    fragment
        .console
        .commands
        .insert("app:orphan".to_string(), "app::Orphan".to_string());

    let merged = Aggregator::default()
        .with_provider(StaticProvider::new("app", fragment))
        .aggregate()
        .unwrap();

    let issues = merged.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::UnregisteredCommandHandler);
    assert_eq!(issues[0].subject, "app:orphan");
}

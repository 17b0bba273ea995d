//! Keel Persistence - persistence wiring for the keel container
//!
//! Provides:
//! - `PersistenceConfigProvider`: factories, aliases, console delegator,
//!   command bindings and default `doctrine` settings
//! - SQLite-backed connection and entity manager collaborators
//! - The console delegator that exposes them to commands
//! - Built-in `dbal:run-sql`, `orm:info` and
//!   `orm:ensure-production-settings` handlers

pub mod commands;
pub mod connection;
pub mod console_delegator;
pub mod db;
pub mod entity_manager;
pub mod errors;
pub mod identifiers;
pub mod provider;
pub mod settings;

use keel_core::Catalog;

use commands::{handler_class, EnsureProductionSettingsCommand, InfoCommand, RunSqlCommand};
use identifiers::{
    CONNECTION_FACTORY, CONSOLE_DELEGATOR_FACTORY, ENSURE_PRODUCTION_SETTINGS_COMMAND,
    ENTITY_MANAGER_FACTORY, INFO_COMMAND, RUN_SQL_COMMAND,
};

// Re-export key types
pub use connection::{Connection, ConnectionFactory};
pub use console_delegator::ConsoleDelegatorFactory;
pub use entity_manager::{EntityManager, EntityManagerFactory};
pub use provider::{
    PersistenceConfigProvider, CONNECTION_ALIAS_PATTERN, CONTAINER_EXCEPTION_MESSAGE_PATTERN,
    DEFAULT_CONNECTION,
};
pub use settings::DoctrineSettings;

/// Add the persistence constructors and built-in handlers to `catalog`
pub fn register_classes(catalog: &mut Catalog) {
    catalog
        .register_factory(ENTITY_MANAGER_FACTORY, EntityManagerFactory)
        .register_factory(CONNECTION_FACTORY, ConnectionFactory)
        .register_delegator(CONSOLE_DELEGATOR_FACTORY, ConsoleDelegatorFactory)
        .register_class(RUN_SQL_COMMAND, handler_class::<RunSqlCommand>())
        .register_class(INFO_COMMAND, handler_class::<InfoCommand>())
        .register_class(
            ENSURE_PRODUCTION_SETTINGS_COMMAND,
            handler_class::<EnsureProductionSettingsCommand>(),
        );
}

//! Built-in console command handlers
//!
//! Only the handlers this build can execute are provided; the other
//! persistence commands stay registered by identifier and fail with the
//! container's configuration error when run.

pub mod ensure_production;
pub mod info;
pub mod run_sql;

use keel_core::console::handler_service;
use keel_core::container::{Container, Factory, Service};
use keel_core::{CommandHandler, Result};

pub use ensure_production::EnsureProductionSettingsCommand;
pub use info::InfoCommand;
pub use run_sql::RunSqlCommand;

/// Catalog class that builds a fresh `H`
pub(crate) fn handler_class<H>() -> impl Factory
where
    H: CommandHandler + Default + 'static,
{
    |_: &Container, _: &str, _: Option<&str>| -> Result<Service> {
        Ok(handler_service(H::default()))
    }
}

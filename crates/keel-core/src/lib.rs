//! Keel Core - configuration wiring and lazy service resolution
//!
//! This crate provides the host side of keel's configuration contract:
//! - Typed configuration fragments (factories, aliases, delegators, console
//!   commands, settings trees)
//! - Providers, including file-backed ones (JSON, TOML, YAML)
//! - The aggregator that merges fragments under an explicit conflict policy
//! - A lazy, memoizing container driven by the merged configuration
//! - The console host service and its command table
//! - Structured errors and the logging facility

pub mod aggregator;
pub mod console;
pub mod container;
pub mod errors;
pub mod logging_facility;
pub mod merge;
pub mod model;
pub mod provider;

pub use keel_core_types as core_types;

// Re-export commonly used types
pub use aggregator::{Aggregator, ConflictPolicy, MergedConfig, ValidationIssue};
pub use console::{CommandContext, CommandHandler, ConsoleApplication, SharedHandler};
pub use container::{Catalog, Container, Service};
pub use errors::{ExError, ExErrorKind, KeelError, Result};
pub use model::{ConfigFragment, FactoryBinding, ServiceKey};
pub use provider::{ConfigProvider, StaticProvider};

//! Console host
//!
//! The console application is itself a container service (`cli::Console`).
//! Its command table comes from the merged `console.commands`; handlers are
//! container services resolved on first use, so a command whose
//! collaborators are not configured fails only when it runs.

use std::any::Any;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregator::MergedConfig;
use crate::core_types::schema::OP_RUN_COMMAND;
use crate::container::{service, Catalog, Container, Factory, Service};
use crate::errors::{ExError, ExErrorKind, KeelError, Result};
use crate::model::{ConfigFragment, ServiceKey};
use crate::provider::ConfigProvider;
use crate::{log_op_end, log_op_error, log_op_start};

/// Service key of the console application
pub const CONSOLE_SERVICE: &str = "cli::Console";

/// Catalog name of [`ConsoleFactory`]
pub const CONSOLE_FACTORY: &str = "cli::ConsoleFactory";

const SUGGESTION_LIMIT: usize = 5;

/// Executes one console command
pub trait CommandHandler: Send + Sync {
    /// One-line summary shown by `commands list`
    fn description(&self) -> &str;

    /// Run the command; the return value is the process exit code
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<i32>;
}

/// How handler services are stored in the container
pub type SharedHandler = Arc<dyn CommandHandler>;

/// Wrap a handler as a container service
pub fn handler_service(handler: impl CommandHandler + 'static) -> Service {
    let shared: SharedHandler = Arc::new(handler);
    service(shared)
}

/// Everything a handler can reach while it runs
pub struct CommandContext<'a> {
    pub container: &'a Container,
    pub console: &'a ConsoleApplication,
    pub name: &'a str,
    pub args: &'a [String],
    pub out: &'a mut dyn Write,
}

impl CommandContext<'_> {
    /// Resolve a console helper by name
    ///
    /// # Errors
    ///
    /// `ERR_NOT_FOUND` for an unknown helper, otherwise as
    /// [`Container::get`].
    pub fn helper<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.console.helper::<T>(self.container, name)
    }

    /// Write one line of command output
    pub fn println(&mut self, line: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", line.as_ref()).map_err(|e| {
            ExError::from(KeelError::Io {
                message: e.to_string(),
            })
        })
    }
}

/// Command name -> handler identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    commands: BTreeMap<String, String>,
}

impl CommandTable {
    pub fn from_config(config: &MergedConfig) -> Self {
        Self {
            commands: config.commands().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// `(name, handler)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands
            .iter()
            .map(|(name, handler)| (name.as_str(), handler.as_str()))
    }

    /// Handler identifier bound to `name`
    ///
    /// # Errors
    ///
    /// `ERR_UNKNOWN_COMMAND` with suggestions from the same namespace or
    /// sharing the typed prefix.
    pub fn handler(&self, name: &str) -> Result<&str> {
        match self.commands.get(name) {
            Some(handler) => Ok(handler),
            None => Err(KeelError::UnknownCommand {
                name: name.to_string(),
                suggestions: self.suggestions(name),
            }
            .into()),
        }
    }

    fn suggestions(&self, name: &str) -> Vec<String> {
        let namespace = name.split(':').next().unwrap_or_default();
        self.commands
            .keys()
            .filter(|candidate| {
                (!name.is_empty() && candidate.starts_with(name))
                    || (!namespace.is_empty()
                        && candidate.split(':').next() == Some(namespace))
            })
            .take(SUGGESTION_LIMIT)
            .cloned()
            .collect()
    }
}

/// The console host service
#[derive(Debug, Clone)]
pub struct ConsoleApplication {
    name: String,
    version: String,
    commands: CommandTable,
    helpers: BTreeMap<String, ServiceKey>,
}

impl ConsoleApplication {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        commands: CommandTable,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            commands,
            helpers: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Attach a helper; the service behind `key` is resolved on first use
    pub fn with_helper(mut self, name: impl Into<String>, key: impl Into<ServiceKey>) -> Self {
        self.helpers.insert(name.into(), key.into());
        self
    }

    /// Helper name -> service key
    pub fn helpers(&self) -> &BTreeMap<String, ServiceKey> {
        &self.helpers
    }

    /// Resolve helper `name` through `container`
    ///
    /// # Errors
    ///
    /// `ERR_NOT_FOUND` when no helper has that name, otherwise as
    /// [`Container::get`].
    pub fn helper<T: Any + Send + Sync>(
        &self,
        container: &Container,
        name: &str,
    ) -> Result<Arc<T>> {
        let key = self.helpers.get(name).ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("console_helper")
                .with_service_key(name)
                .with_message(format!("no console helper named `{}`", name))
                .with_candidates(self.helpers.keys().cloned().collect())
        })?;
        container.get::<T>(key.as_str())
    }

    /// Resolve the handler bound to `name`
    ///
    /// # Errors
    ///
    /// `ERR_UNKNOWN_COMMAND`, or the handler's resolution error.
    pub fn handler(&self, container: &Container, name: &str) -> Result<SharedHandler> {
        let handler_id = self.commands.handler(name)?;
        let handler = container.get::<SharedHandler>(handler_id)?;
        Ok(SharedHandler::clone(&handler))
    }

    /// Run command `name` with `args`, writing its output to `out`
    ///
    /// # Errors
    ///
    /// Unknown command, unresolvable handler, or the handler's own failure.
    pub fn run(
        &self,
        container: &Container,
        name: &str,
        args: &[String],
        out: &mut dyn Write,
    ) -> Result<i32> {
        let started = Instant::now();
        log_op_start!(OP_RUN_COMMAND, command = name, arg_count = args.len());

        let result = self.handler(container, name).and_then(|handler| {
            let mut ctx = CommandContext {
                container,
                console: self,
                name,
                args,
                out,
            };
            handler.execute(&mut ctx)
        });

        match &result {
            Ok(code) => {
                log_op_end!(
                    OP_RUN_COMMAND,
                    duration_ms = started.elapsed().as_millis() as u64,
                    command = name,
                    exit_code = *code
                );
            }
            Err(err) => {
                log_op_error!(
                    OP_RUN_COMMAND,
                    err,
                    duration_ms = started.elapsed().as_millis() as u64,
                    command = name
                );
            }
        }
        result
    }
}

/// Builds the [`ConsoleApplication`] from the container's configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFactory;

impl Factory for ConsoleFactory {
    fn create(
        &self,
        container: &Container,
        _service_key: &str,
        _argument: Option<&str>,
    ) -> Result<Service> {
        let app = ConsoleApplication::new(
            "keel",
            env!("CARGO_PKG_VERSION"),
            CommandTable::from_config(container.config()),
        );
        Ok(service(app))
    }
}

/// Registers the console host service
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleConfigProvider;

impl ConfigProvider for ConsoleConfigProvider {
    fn name(&self) -> &str {
        "console"
    }

    fn provide(&self) -> ConfigFragment {
        ConfigFragment::new().factory(CONSOLE_SERVICE, CONSOLE_FACTORY)
    }
}

/// Add the console constructors to `catalog`
pub fn register_classes(catalog: &mut Catalog) {
    catalog.register_factory(CONSOLE_FACTORY, ConsoleFactory);
}

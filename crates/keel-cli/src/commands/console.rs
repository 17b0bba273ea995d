//! Console commands

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use keel_core::console::{ConsoleApplication, CONSOLE_SERVICE};

use crate::bootstrap::{self, Options};

#[derive(Debug, Args)]
pub struct CommandsArgs {
    /// Only commands in this namespace (e.g. `orm`)
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Console command name, e.g. `dbal:run-sql`
    pub command: String,

    /// Arguments passed to the command handler
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub fn list(args: CommandsArgs, options: &Options) -> Result<i32> {
    let container = bootstrap::container(options)?;
    let console = container
        .get::<ConsoleApplication>(CONSOLE_SERVICE)
        .context("building the console")?;

    let prefix = args.namespace.map(|ns| format!("{}:", ns));
    for (name, handler) in console.commands().iter() {
        if let Some(prefix) = &prefix {
            if !name.starts_with(prefix.as_str()) {
                continue;
            }
        }
        let availability = if container.catalog().has_class(handler) {
            "built-in"
        } else {
            "external"
        };
        println!("{}\t{}\t{}", name, handler, availability);
    }
    Ok(0)
}

pub fn run(args: RunArgs, options: &Options) -> Result<i32> {
    let container = bootstrap::container(options)?;
    let console = container
        .get::<ConsoleApplication>(CONSOLE_SERVICE)
        .context("building the console")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = console
        .run(&container, &args.command, &args.args, &mut out)
        .with_context(|| format!("running `{}`", args.command))?;
    out.flush().context("flushing command output")?;
    Ok(code)
}

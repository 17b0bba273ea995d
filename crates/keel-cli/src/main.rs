//! Keel CLI
//!
//! Command-line host for the keel container: inspect the merged
//! configuration, resolve services and run console commands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keel_core::logging_facility::{init, Profile};
use keel_core::ConflictPolicy;

mod bootstrap;
mod commands;

#[derive(Debug, Parser)]
#[command(name = "keel-cli")]
#[command(about = "Keel - configuration wiring and persistence console", long_about = None)]
struct Cli {
    /// Extra configuration file (json, toml, yaml); later files override earlier ones
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Vec<PathBuf>,

    /// What to do when two providers bind the same identifier (reject, last-wins)
    #[arg(long, default_value = "reject", global = true)]
    conflict_policy: ConflictPolicy,

    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect the merged configuration
    Config(commands::config::ConfigArgs),
    /// Inspect and resolve container services
    Services(commands::services::ServicesArgs),
    /// List console commands
    Commands(commands::console::CommandsArgs),
    /// Run a console command
    Run(commands::console::RunArgs),
}

fn main() {
    let cli = Cli::parse();

    init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let options = bootstrap::Options {
        config_files: cli.config,
        policy: cli.conflict_policy,
    };

    let result = match cli.command {
        Command::Config(args) => commands::config::execute(args, &options),
        Command::Services(args) => commands::services::execute(args, &options),
        Command::Commands(args) => commands::console::list(args, &options),
        Command::Run(args) => commands::console::run(args, &options),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

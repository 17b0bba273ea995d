//! Configuration inspection commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use keel_persistence::settings::redacted;

use crate::bootstrap::{self, Options};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the merged configuration as JSON, secrets redacted
    Dump,
    /// Merge all providers, report providers, digest and wiring issues
    Check,
}

pub fn execute(args: ConfigArgs, options: &Options) -> Result<i32> {
    let merged = bootstrap::aggregate(options)?;

    match args.command {
        ConfigCommand::Dump => {
            let rendered = serde_json::to_string_pretty(&redacted(&merged.to_value()))
                .context("rendering merged configuration")?;
            println!("{}", rendered);
            Ok(0)
        }
        ConfigCommand::Check => {
            println!("providers: {}", merged.providers().join(", "));
            println!("policy: {}", merged.policy());
            println!("commands: {}", merged.commands().len());
            println!("digest: {}", merged.digest());

            let issues = merged.validate();
            for issue in &issues {
                println!("issue: {}", issue);
            }
            if issues.is_empty() {
                println!("OK");
                Ok(0)
            } else {
                Ok(1)
            }
        }
    }
}

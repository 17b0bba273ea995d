//! Service inspection commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use keel_core::{Container, FactoryBinding};

use crate::bootstrap::{self, Options};

#[derive(Debug, Args)]
pub struct ServicesArgs {
    #[command(subcommand)]
    pub command: ServicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServicesCommand {
    /// List every registered identifier
    List,
    /// Show where an identifier leads
    Resolve {
        /// Service identifier or alias
        id: String,

        /// Also build the service
        #[arg(long)]
        instantiate: bool,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(args: ServicesArgs, options: &Options) -> Result<i32> {
    let container = bootstrap::container(options)?;

    match args.command {
        ServicesCommand::List => {
            list(&container);
            Ok(0)
        }
        ServicesCommand::Resolve {
            id,
            instantiate,
            json,
        } => {
            let resolution = container
                .describe(&id)
                .with_context(|| format!("resolving `{}`", id))?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&resolution).context("rendering resolution")?
                );
            } else {
                println!("{}", resolution);
            }

            if instantiate {
                container
                    .get_service(&id)
                    .with_context(|| format!("instantiating `{}`", id))?;
                println!("instantiated {}", resolution.key);
            }
            Ok(0)
        }
    }
}

fn list(container: &Container) {
    let config = container.config();
    let fragment = config.fragment();

    for (key, binding) in &fragment.factories {
        let target = match binding {
            FactoryBinding::Constructor(ctor) => ctor.clone(),
            FactoryBinding::Parameterized(ctor, arg) => format!("{}({})", ctor, arg),
        };
        println!(
            "{}\tfactory\t{}\t{}",
            key,
            target,
            config.origin_of_factory(key.as_str()).unwrap_or("-")
        );
    }

    for (id, target) in fragment
        .services
        .iter()
        .chain(fragment.console.services.iter())
    {
        let kind = if id == target { "class" } else { "alias" };
        println!(
            "{}\t{}\t{}\t{}",
            id,
            kind,
            target,
            config.origin_of_service(id.as_str()).unwrap_or("-")
        );
    }
}

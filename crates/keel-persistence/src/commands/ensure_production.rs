use keel_core::{CommandContext, CommandHandler, Result};

use crate::console_delegator::ENTITY_MANAGER_HELPER;
use crate::entity_manager::EntityManager;

/// `orm:ensure-production-settings [--complete]`
///
/// Fails while the metadata cache is not persistent; `--complete` also
/// checks that the connection answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureProductionSettingsCommand;

impl CommandHandler for EnsureProductionSettingsCommand {
    fn description(&self) -> &str {
        "Verify that the ORM is properly configured for a production environment."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let em = ctx.helper::<EntityManager>(ENTITY_MANAGER_HELPER)?;

        if !em.has_persistent_cache() {
            ctx.println(format!(
                "Metadata Cache uses a non-persistent cache driver (`{}`).",
                em.cache()
            ))?;
            return Ok(1);
        }

        if ctx.args.iter().any(|arg| arg == "--complete") {
            em.connection().ping()?;
        }

        ctx.println("Environment is correctly configured for production.")?;
        Ok(0)
    }
}

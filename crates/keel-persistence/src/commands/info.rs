use keel_core::{CommandContext, CommandHandler, Result};

use crate::console_delegator::ENTITY_MANAGER_HELPER;
use crate::entity_manager::EntityManager;

/// `orm:info`: list the entities the mapping driver can see
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoCommand;

impl CommandHandler for InfoCommand {
    fn description(&self) -> &str {
        "Show basic information about all mapped entities"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let em = ctx.helper::<EntityManager>(ENTITY_MANAGER_HELPER)?;
        let entities = em.mapped_entities()?;

        if entities.is_empty() {
            ctx.println(
                "You do not have any mapped ORM entities according to the current configuration.",
            )?;
            return Ok(1);
        }

        ctx.println(format!("Found {} mapped entities:", entities.len()))?;
        for entity in &entities {
            ctx.println(format!(" [OK]   {}", entity))?;
        }
        Ok(0)
    }
}

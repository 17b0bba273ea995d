use keel_core::{CommandContext, CommandHandler, Result};

use crate::connection::{Connection, SqlOutcome};
use crate::console_delegator::CONNECTION_HELPER;
use crate::errors::command_failed;

/// `dbal:run-sql <SQL>`: execute one statement against the connection
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSqlCommand;

impl CommandHandler for RunSqlCommand {
    fn description(&self) -> &str {
        "Executes arbitrary SQL directly from the command line."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let sql = ctx.args.join(" ");
        if sql.trim().is_empty() {
            return Err(command_failed(ctx.name, "argument SQL is required"));
        }

        let connection = ctx.helper::<Connection>(CONNECTION_HELPER)?;
        match connection.run(&sql)? {
            SqlOutcome::Affected(count) => {
                ctx.println(format!("{} row(s) affected.", count))?;
            }
            SqlOutcome::Rows(result) => {
                ctx.println(result.columns.join(" | "))?;
                for row in &result.rows {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|value| match value {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect();
                    ctx.println(cells.join(" | "))?;
                }
            }
        }
        Ok(0)
    }
}

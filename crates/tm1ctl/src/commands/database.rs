//! Database command handlers, against the effective instance.

use serde_json::Value;
use tm1ctl_config::Config;
use tm1ctl_core::InstanceApi;

use crate::cli::{DatabaseArgs, DatabaseCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    args: DatabaseArgs,
    cfg: &Config,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let rest = config::rest_client(global)?;
    let api = InstanceApi::resolve(&rest, cfg, &config::overrides(global, None))?;

    let data = match args.command {
        DatabaseCommand::List => Value::Array(api.list_databases().await?),

        DatabaseCommand::Get { name } => Value::Object(api.get_database(&name).await?),

        DatabaseCommand::Create { name } => match api.create_database(&name).await? {
            Some(created) => Value::Object(created),
            None => {
                output::print_output(&format!("Created database '{name}'."), global.quiet);
                return Ok(());
            }
        },

        DatabaseCommand::Delete { name } => {
            if !util::confirm(
                &format!("Delete database '{name}'? This removes all of its data."),
                "database delete",
                global.yes,
            )? {
                return Ok(());
            }
            api.delete_database(&name).await?;
            output::print_output(&format!("Database '{name}' has been deleted."), global.quiet);
            return Ok(());
        }
    };

    let out = output::render(format, &data)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

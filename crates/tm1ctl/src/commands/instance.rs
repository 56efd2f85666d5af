//! Instance command handlers, against the host's management API.

use serde_json::Value;
use tm1ctl_config::{Config, non_empty};
use tm1ctl_core::ManagementApi;

use crate::cli::{GlobalOpts, InstanceArgs, InstanceCommand, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    args: InstanceArgs,
    cfg: &mut Config,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    // `use` only touches the local configuration.
    if let InstanceCommand::Use { name } = &args.command {
        let host = cfg.use_instance(global.host.as_deref(), name.as_deref())?;
        config::save(cfg, global)?;
        let msg = match non_empty(name.as_deref()) {
            Some(name) => format!("Set active instance on host '{host}' to '{name}'."),
            None => format!("Reset active instance on host '{host}'."),
        };
        output::print_output(&msg, global.quiet);
        return Ok(());
    }

    let rest = config::rest_client(global)?;
    let api = ManagementApi::resolve(&rest, cfg, &config::overrides(global, None))?;

    match args.command {
        InstanceCommand::List { name } => {
            let data = match non_empty(name.as_deref()) {
                Some(name) => Value::Object(api.get_instance(name).await?),
                None => Value::Array(api.list_instances().await?),
            };
            let out = output::render(format, &data)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InstanceCommand::Create { name } => {
            match api.create_instance(&name).await? {
                Some(created) => {
                    let out = output::render(format, &Value::Object(created))?;
                    output::print_output(&out, global.quiet);
                }
                None => {
                    output::print_output(&format!("Created instance '{name}'."), global.quiet);
                }
            }
            Ok(())
        }

        InstanceCommand::Delete { name } => {
            if !util::confirm(
                &format!("Delete instance '{name}' and all of its databases?"),
                "instance delete",
                global.yes,
            )? {
                return Ok(());
            }
            api.delete_instance(&name).await?;
            output::print_output(&format!("Instance '{name}' has been deleted."), global.quiet);
            Ok(())
        }

        // Handled above
        InstanceCommand::Use { .. } => unreachable!(),
    }
}

//! Host command handlers. These only touch the local configuration.

use tm1ctl_config::{Config, HostField, apply_field, non_empty, validate_service_root_url};

use crate::cli::{GlobalOpts, HostArgs, HostCommand, HostSetArgs, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output::{self, NamedEntry};

use super::util;

pub fn handle(
    args: HostArgs,
    cfg: &mut Config,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match args.command {
        HostCommand::List { name } => list(cfg, name.as_deref(), global, format),

        HostCommand::Set(set) => {
            let name = set.name.clone();
            if apply(cfg, set)? {
                config::save(cfg, global)?;
                output::print_output(&format!("Updated host '{name}'."), global.quiet);
            } else {
                output::print_output("No changes specified.", global.quiet);
            }
            Ok(())
        }

        HostCommand::Use { name } => {
            cfg.use_host(name.as_deref())?;
            config::save(cfg, global)?;
            let msg = match non_empty(name.as_deref()) {
                Some(name) => format!("Switched to host '{name}'."),
                None => "Reset active host.".into(),
            };
            output::print_output(&msg, global.quiet);
            Ok(())
        }

        HostCommand::Delete { name } => {
            cfg.delete_host(&name)?;
            config::save(cfg, global)?;
            output::print_output(&format!("Deleted host '{name}'."), global.quiet);
            Ok(())
        }
    }
}

fn list(
    cfg: &Config,
    name: Option<&str>,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let entries: Vec<NamedEntry<'_>> = match non_empty(name) {
        Some(name) => {
            let entry = cfg.hosts.get(name).ok_or_else(|| CliError::NotDefined {
                kind: "host",
                name: name.to_owned(),
                list_command: "host list".into(),
            })?;
            vec![NamedEntry {
                name,
                entry,
                active: cfg.host.as_deref() == Some(name),
            }]
        }
        None if cfg.hosts.is_empty() => {
            output::print_output("No hosts configured.", global.quiet);
            return Ok(());
        }
        None => cfg
            .hosts
            .iter()
            .map(|(name, entry)| NamedEntry {
                name,
                entry,
                active: cfg.host.as_deref() == Some(name.as_str()),
            })
            .collect(),
    };

    let out = output::render_entries(format, &entries)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Apply `host set`; returns whether anything changed.
fn apply(cfg: &mut Config, set: HostSetArgs) -> Result<bool, CliError> {
    if let Some(url) = non_empty(set.service_root_url.as_deref()) {
        validate_service_root_url(url)?;
    }
    let secret = if set.prompt_root_client_secret {
        Some(util::prompt_secret("Root client secret")?)
    } else {
        set.root_client_secret
    };

    let entry = cfg.host_entry_mut(&set.name)?;
    let mut changed = apply_field(
        entry,
        HostField::ServiceRootUrl.key(),
        set.service_root_url.as_deref(),
    );
    changed |= apply_field(
        entry,
        HostField::RootClientId.key(),
        set.root_client_id.as_deref(),
    );
    changed |= apply_field(entry, HostField::RootClientSecret.key(), secret.as_deref());
    Ok(changed)
}

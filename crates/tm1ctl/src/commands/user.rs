//! User command handlers. These only touch the local configuration.

use serde_json::{Map, Value};
use tm1ctl_config::{Config, apply_field, non_empty, resolve_user_config, resolve_user_name};

use crate::cli::{
    GlobalOpts, OutputFormat, UserArgs, UserCommand, UserSetArgs, VariableArgs, VariableCommand,
};
use crate::config;
use crate::error::CliError;
use crate::output::{self, NamedEntry};

use super::util;

pub fn handle(
    args: UserArgs,
    cfg: &mut Config,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match args.command {
        UserCommand::List { name } => list(cfg, name.as_deref(), global, format),

        UserCommand::Set(set) => {
            let prompted = if set.prompt_password {
                Some(util::prompt_secret("Password")?)
            } else {
                None
            };
            let password = prompted.as_deref().or(set.password.as_deref());
            if apply(cfg, &set, password)? {
                config::save(cfg, global)?;
                output::print_output(&format!("Updated user '{}'.", set.name), global.quiet);
            } else {
                output::print_output("No changes specified.", global.quiet);
            }
            Ok(())
        }

        UserCommand::Use { name } => {
            cfg.use_user(name.as_deref())?;
            config::save(cfg, global)?;
            let msg = match non_empty(name.as_deref()) {
                Some(name) => format!("Switched to user '{name}'."),
                None => "Reset active user.".into(),
            };
            output::print_output(&msg, global.quiet);
            Ok(())
        }

        UserCommand::Delete { name } => {
            cfg.delete_user(&name)?;
            config::save(cfg, global)?;
            output::print_output(&format!("Deleted user '{name}'."), global.quiet);
            Ok(())
        }

        UserCommand::Variable(args) => variable(args, cfg, global, format),
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
            let entry = cfg.users.get(name).ok_or_else(|| CliError::NotDefined {
                kind: "user",
                name: name.to_owned(),
                list_command: "user list".into(),
            })?;
            vec![NamedEntry {
                name,
                entry,
                active: cfg.user.as_deref() == Some(name),
            }]
        }
        None if cfg.users.is_empty() => {
            output::print_output("No users configured.", global.quiet);
            return Ok(());
        }
        None => cfg
            .users
            .iter()
            .map(|(name, entry)| NamedEntry {
                name,
                entry,
                active: cfg.user.as_deref() == Some(name.as_str()),
            })
            .collect(),
    };

    let out = output::render_entries(format, &entries)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Apply `user set`; returns whether anything changed.
fn apply(cfg: &mut Config, set: &UserSetArgs, password: Option<&str>) -> Result<bool, CliError> {
    // `Null` marks an explicit removal.
    let variables = match set.variables.as_deref() {
        None => None,
        Some("") => Some(Value::Null),
        Some(raw) => Some(parse_variables(raw)?),
    };

    let entry = cfg.user_entry_mut(&set.name)?;
    let mut changed = apply_field(entry, "name", set.identity.as_deref());
    changed |= apply_field(entry, "password", password);
    match variables {
        None => {}
        Some(Value::Null) => changed |= entry.remove("variables").is_some(),
        Some(vars) => {
            entry.insert("variables".into(), vars);
            changed = true;
        }
    }
    Ok(changed)
}

fn parse_variables(raw: &str) -> Result<Value, CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: "variables".into(),
        reason,
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(vars @ Value::Object(_)) => Ok(vars),
        Ok(_) => Err(invalid("expected a JSON object".into())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

// ── Variables ───────────────────────────────────────────────────────

fn variable(
    args: VariableArgs,
    cfg: &mut Config,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match args.command {
        VariableCommand::List { key } => {
            let user = resolve_user_name(cfg, global.user.as_deref())?;
            let entry = resolve_user_config(cfg, Some(user))?.ok_or_else(|| {
                CliError::NotDefined {
                    kind: "user",
                    name: user.to_owned(),
                    list_command: "user list".into(),
                }
            })?;
            let empty = Map::new();
            let vars = entry.variables()?.unwrap_or(&empty);

            let rows: Vec<Value> = match non_empty(key.as_deref()) {
                Some(key) => {
                    let value = vars.get(key).ok_or_else(|| CliError::NotDefined {
                        kind: "variable",
                        name: key.to_owned(),
                        list_command: "user variable list".into(),
                    })?;
                    vec![variable_row(key, value)]
                }
                None => vars.iter().map(|(k, v)| variable_row(k, v)).collect(),
            };

            let out = output::render(format, &Value::Array(rows))?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VariableCommand::Set { key, value } => {
            let user =
                cfg.set_user_variable(global.user.as_deref(), &key, util::parse_value(&value))?;
            config::save(cfg, global)?;
            output::print_output(
                &format!("Set variable '{key}' for user '{user}'."),
                global.quiet,
            );
            Ok(())
        }
    }
}

fn variable_row(key: &str, value: &Value) -> Value {
    let mut row = Map::new();
    row.insert("Name".into(), Value::String(key.to_owned()));
    row.insert("Value".into(), value.clone());
    Value::Object(row)
}

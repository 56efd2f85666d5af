//! `config` command handlers: effective settings and the config file path.

use clap::ValueEnum;
use serde_json::{Map, Value};
use tm1ctl_config::{
    Config, resolve_host_config, resolve_host_name, resolve_instance_name, resolve_user_name,
};

use crate::cli::{ConfigArgs, ConfigCommand, ConfigKey, GlobalOpts, OutputFormat, SettableKey};
use crate::config;
use crate::error::CliError;
use crate::output;

const KEYS: &[ConfigKey] = &[
    ConfigKey::Host,
    ConfigKey::Instance,
    ConfigKey::User,
    ConfigKey::OutputFormat,
];

pub fn handle(
    args: ConfigArgs,
    cfg: &mut Config,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::List { key } => {
            let keys = key.as_ref().map_or(KEYS, std::slice::from_ref);
            let rows: Vec<Value> = keys
                .iter()
                .map(|key| {
                    let mut row = Map::new();
                    row.insert("Name".into(), Value::String(key_name(*key).into()));
                    row.insert(
                        "Value".into(),
                        effective(cfg, global, format, *key).map_or(Value::Null, Value::String),
                    );
                    Value::Object(row)
                })
                .collect();

            let out = output::render(format, &Value::Array(rows))?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            match key {
                SettableKey::OutputFormat => cfg.set_output_format(&value)?,
            }
            config::save(cfg, global)?;
            output::print_output(
                &format!("Set {} to '{value}'.", settable_name(key)),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &config::config_path(global).display().to_string(),
                global.quiet,
            );
            Ok(())
        }
    }
}

/// The value in effect for this invocation, flags and environment included.
fn effective(
    cfg: &Config,
    global: &GlobalOpts,
    format: OutputFormat,
    key: ConfigKey,
) -> Option<String> {
    match key {
        ConfigKey::Host => resolve_host_name(cfg, global.host.as_deref())
            .ok()
            .map(str::to_owned),
        ConfigKey::Instance => resolve_host_config(cfg, global.host.as_deref())
            .ok()
            .and_then(|host| {
                resolve_instance_name(&host, global.instance.as_deref())
                    .ok()
                    .map(str::to_owned)
            }),
        ConfigKey::User => resolve_user_name(cfg, global.user.as_deref())
            .ok()
            .map(str::to_owned),
        ConfigKey::OutputFormat => format
            .to_possible_value()
            .map(|v| v.get_name().to_owned()),
    }
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::Host => "host",
        ConfigKey::Instance => "instance",
        ConfigKey::User => "user",
        ConfigKey::OutputFormat => "output-format",
    }
}

fn settable_name(key: SettableKey) -> &'static str {
    match key {
        SettableKey::OutputFormat => "output-format",
    }
}

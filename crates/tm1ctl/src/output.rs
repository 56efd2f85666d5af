//! Output formatting: table, JSON, YAML.
//!
//! Responses are untyped JSON, so the table is built dynamically: one column
//! per key of the first row, sorted, with nested values as compact JSON.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

const MASK: &str = "****";

/// Keys whose values are never printed.
const SECRET_KEYS: &[&str] = &["password", "root_client_secret"];

// ── Colors ──────────────────────────────────────────────────────────

/// Color only when stdout is a terminal and `NO_COLOR` is unset.
pub fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

// ── Render dispatchers ──────────────────────────────────────────────

/// Render a single entity or a collection in the chosen format.
pub fn render(format: OutputFormat, data: &Value) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => {
            serde_yaml::to_string(data).map_err(|e| CliError::Io(io::Error::other(e)))
        }
    }
}

/// A configured host or user, keyed by its name.
pub struct NamedEntry<'a> {
    pub name: &'a str,
    pub entry: &'a Value,
    pub active: bool,
}

/// Render configured entries with secrets masked and the active one marked.
///
/// Structured formats get `Name` and `Active` properties; the table marks
/// the active row with `*`.
pub fn render_entries(
    format: OutputFormat,
    entries: &[NamedEntry<'_>],
) -> Result<String, CliError> {
    let color = format == OutputFormat::Table && should_color();
    let rows: Vec<Value> = entries
        .iter()
        .map(|e| {
            let mut row = Map::new();
            let name = match (format, e.active) {
                (OutputFormat::Table, true) if color => {
                    format!("{} {}", e.name.green(), "*".green())
                }
                (OutputFormat::Table, true) => format!("{} *", e.name),
                _ => e.name.to_owned(),
            };
            row.insert("Name".into(), Value::String(name));
            if format != OutputFormat::Table {
                row.insert("Active".into(), Value::Bool(e.active));
            }
            match mask_secrets(e.entry) {
                Value::Object(fields) => row.extend(fields),
                other => {
                    row.insert("Value".into(), other);
                }
            }
            Value::Object(row)
        })
        .collect();

    render(format, &Value::Array(rows))
}

/// Replace secret values with `****`.
pub fn mask_secrets(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if SECRET_KEYS.contains(&k.as_str()) && !v.is_null() {
                        Value::String(MASK.into())
                    } else {
                        v.clone()
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", output.trim_end());
}

// ── Table ───────────────────────────────────────────────────────────

fn render_table(data: &Value) -> String {
    let rows: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    let Some(first) = rows.first() else {
        return "No data.".into();
    };

    let mut headers: Vec<&str> = match first {
        Value::Object(map) => map.keys().map(String::as_str).collect(),
        _ => vec!["Value"],
    };
    headers.sort_unstable();

    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| (*h).to_owned()));
    for row in rows {
        builder.push_record(headers.iter().map(|h| match row {
            Value::Object(map) => map.get(*h).map(cell).unwrap_or_default(),
            scalar => cell(scalar),
        }));
    }

    builder.build().with(Style::rounded()).to_string()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        nested => serde_json::to_string(nested).unwrap_or_default(),
    }
}

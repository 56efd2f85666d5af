//! Configuration store and credential resolution for tm1ctl.
//!
//! The store is a single JSON document holding the configured hosts and
//! users plus the active selection (host, user, and each host's instance).
//! It is loaded once per invocation into a [`Config`] snapshot; the
//! [`resolve`] module turns that snapshot plus explicit overrides into
//! endpoints and `Authorization` values. Apart from the first-run defaults
//! written by [`load_or_init_config`], only the `use`/`set`/`delete` command
//! handlers mutate the snapshot and [`save_config`] it.

pub mod resolve;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Format, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub use resolve::{
    HostConfig, HostField, Overrides, ResolveError, UserConfig, entity_key, non_empty,
    resolve_database_root_url, resolve_host_config, resolve_host_name, resolve_instance_name,
    resolve_instance_root_url, resolve_management_root_url, resolve_root_authorization,
    resolve_user_authorization, resolve_user_config, resolve_user_name, with_override,
};

/// A JSON object as stored for a single host or user entry.
pub type Entry = serde_json::Map<String, Value>;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{kind} '{name}' is not defined")]
    NotDefined { kind: &'static str, name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to update configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config document ─────────────────────────────────────────────────

/// The persisted configuration document.
///
/// Host and user entries are kept as raw JSON so a malformed entry surfaces
/// as a resolution error for that entry instead of failing the whole load.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Active host name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Active user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Default output format: "table" or "json".
    #[serde(rename = "output-format", default = "default_output_format")]
    pub output_format: String,

    /// Configured hosts, keyed by name.
    #[serde(default)]
    pub hosts: BTreeMap<String, Value>,

    /// Configured users, keyed by name.
    #[serde(default)]
    pub users: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        let mut local = Entry::new();
        local.insert(
            HostField::ServiceRootUrl.key().into(),
            Value::String("http://localhost:4444".into()),
        );

        Self {
            host: Some("local".into()),
            user: None,
            output_format: default_output_format(),
            hosts: BTreeMap::from([("local".to_owned(), Value::Object(local))]),
            users: BTreeMap::new(),
        }
    }
}

fn default_output_format() -> String {
    "table".into()
}

/// Output formats accepted for the persisted `output-format` key.
pub const OUTPUT_FORMATS: &[&str] = &["table", "json"];

// ── Config file path ────────────────────────────────────────────────

/// File name of the config document in the home directory.
const HOME_FILE_NAME: &str = ".tm1ctl.json";

/// Resolve the default config file path.
///
/// An existing `~/.tm1ctl.json` is used as is; otherwise the file lives in
/// the platform config directory.
pub fn config_path() -> PathBuf {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().join(HOME_FILE_NAME));
    let platform = ProjectDirs::from("com", "tm1ctl", "tm1ctl")
        .map(|dirs| dirs.config_dir().join("config.json"));
    select_config_path(home, platform)
}

fn select_config_path(home: Option<PathBuf>, platform: Option<PathBuf>) -> PathBuf {
    match (home, platform) {
        (Some(home), _) if home.is_file() => home,
        (_, Some(platform)) => platform,
        (Some(home), None) => home,
        (None, None) => PathBuf::from(HOME_FILE_NAME),
    }
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config document at `path`.
///
/// A missing file yields [`Config::default`] without touching the disk.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config: Config = Figment::from(Json::file(path)).extract()?;
    Ok(config)
}

/// Load the config document at `path`, writing the defaults there first
/// when no document exists yet.
pub fn load_or_init_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load_config(path);
    }
    let config = Config::default();
    save_config(&config, path)?;
    info!(path = %path.display(), "created default configuration");
    Ok(config)
}

/// Serialize config as pretty JSON and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Mutations ───────────────────────────────────────────────────────

/// Apply an optional field update to an entry.
///
/// `None` leaves the field alone, an empty value removes it, anything else
/// sets it. Returns whether the entry changed.
pub fn apply_field(entry: &mut Entry, key: &str, value: Option<&str>) -> bool {
    match value {
        None => false,
        Some("") => entry.remove(key).is_some(),
        Some(v) => {
            entry.insert(key.to_owned(), Value::String(v.to_owned()));
            true
        }
    }
}

/// Reject service root URLs that are not absolute http(s) URLs.
pub fn validate_service_root_url(raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: "service root URL".into(),
        reason: format!("'{raw}' is not a valid URL: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Validation {
            field: "service root URL".into(),
            reason: format!("unsupported scheme '{other}', expected http or https"),
        }),
    }
}

impl Config {
    /// The host entry `name`, created empty when absent.
    pub fn host_entry_mut(&mut self, name: &str) -> Result<&mut Entry, ConfigError> {
        let value = self
            .hosts
            .entry(name.to_owned())
            .or_insert_with(|| Value::Object(Entry::new()));
        if value.is_null() {
            *value = Value::Object(Entry::new());
        }
        value.as_object_mut().ok_or_else(|| {
            ResolveError::MalformedHostConfig {
                host: name.to_owned(),
            }
            .into()
        })
    }

    /// The user entry `name`, created empty when absent.
    pub fn user_entry_mut(&mut self, name: &str) -> Result<&mut Entry, ConfigError> {
        let value = self
            .users
            .entry(name.to_owned())
            .or_insert_with(|| Value::Object(Entry::new()));
        if value.is_null() {
            *value = Value::Object(Entry::new());
        }
        value.as_object_mut().ok_or_else(|| {
            ResolveError::MalformedUserConfig {
                user: name.to_owned(),
            }
            .into()
        })
    }

    /// Make `name` the active host, or clear the selection with `None`.
    pub fn use_host(&mut self, name: Option<&str>) -> Result<(), ConfigError> {
        self.host = select(&self.hosts, "host", name)?;
        Ok(())
    }

    /// Make `name` the active user, or clear the selection with `None`.
    pub fn use_user(&mut self, name: Option<&str>) -> Result<(), ConfigError> {
        self.user = select(&self.users, "user", name)?;
        Ok(())
    }

    /// Remove a host, clearing the active selection if it pointed at it.
    pub fn delete_host(&mut self, name: &str) -> Result<(), ConfigError> {
        remove(&mut self.hosts, &mut self.host, "host", name)
    }

    /// Remove a user, clearing the active selection if it pointed at it.
    pub fn delete_user(&mut self, name: &str) -> Result<(), ConfigError> {
        remove(&mut self.users, &mut self.user, "user", name)
    }

    /// Set or clear the active instance of a host.
    ///
    /// The host is resolved with the usual override rule and must already
    /// be configured. Returns the host name that was updated.
    pub fn use_instance(
        &mut self,
        host: Option<&str>,
        instance: Option<&str>,
    ) -> Result<String, ConfigError> {
        let name = resolve_host_config(self, host)?.name().to_owned();
        let entry = self.host_entry_mut(&name)?;
        entry.insert(
            HostField::Instance.key().into(),
            Value::String(instance.unwrap_or_default().to_owned()),
        );
        Ok(name)
    }

    /// Set a session variable on a user, resolved with the usual override rule.
    ///
    /// Returns the user name that was updated.
    pub fn set_user_variable(
        &mut self,
        user: Option<&str>,
        key: &str,
        value: Value,
    ) -> Result<String, ConfigError> {
        let name = resolve_user_name(self, user)?.to_owned();
        let entry = self.user_entry_mut(&name)?;
        let variables = entry
            .entry("variables")
            .or_insert_with(|| Value::Object(Entry::new()));
        if variables.is_null() {
            *variables = Value::Object(Entry::new());
        }
        let Some(variables) = variables.as_object_mut() else {
            return Err(ResolveError::InvalidUserField {
                field: "variables",
                user: name,
            }
            .into());
        };
        variables.insert(key.to_owned(), value);
        Ok(name)
    }

    /// Validate and set the persisted output format.
    pub fn set_output_format(&mut self, format: &str) -> Result<(), ConfigError> {
        if !OUTPUT_FORMATS.contains(&format) {
            return Err(ConfigError::Validation {
                field: "output-format".into(),
                reason: format!(
                    "'{format}' is not a recognized output format, expected one of: {}",
                    OUTPUT_FORMATS.join(", ")
                ),
            });
        }
        format.clone_into(&mut self.output_format);
        Ok(())
    }
}

fn select(
    entries: &BTreeMap<String, Value>,
    kind: &'static str,
    name: Option<&str>,
) -> Result<Option<String>, ConfigError> {
    match non_empty(name) {
        None => Ok(None),
        Some(name) if entries.contains_key(name) => Ok(Some(name.to_owned())),
        Some(name) => Err(ConfigError::NotDefined {
            kind,
            name: name.to_owned(),
        }),
    }
}

fn remove(
    entries: &mut BTreeMap<String, Value>,
    active: &mut Option<String>,
    kind: &'static str,
    name: &str,
) -> Result<(), ConfigError> {
    if entries.remove(name).is_none() {
        return Err(ConfigError::NotDefined {
            kind,
            name: name.to_owned(),
        });
    }
    if active.as_deref() == Some(name) {
        *active = None;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sample() -> Config {
        serde_json::from_value(json!({
            "host": "local",
            "user": "admin",
            "hosts": {
                "local": { "service_root_url": "http://localhost:4444" },
                "broken": "not an object"
            },
            "users": {
                "admin": { "password": "apple" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("config.json")).unwrap();

        assert_eq!(cfg.host.as_deref(), Some("local"));
        assert_eq!(cfg.output_format, "table");
        assert_eq!(
            cfg.hosts["local"]["service_root_url"],
            json!("http://localhost:4444")
        );
    }

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tm1ctl").join("config.json");

        let cfg = load_or_init_config(&path).unwrap();
        assert_eq!(cfg.host.as_deref(), Some("local"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["host"], json!("local"));
        assert_eq!(written["output-format"], json!("table"));
        assert_eq!(
            written["hosts"]["local"]["service_root_url"],
            json!("http://localhost:4444")
        );
    }

    #[test]
    fn init_keeps_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "host": "remote", "hosts": { "remote": {} } }"#).unwrap();

        let cfg = load_or_init_config(&path).unwrap();
        assert_eq!(cfg.host.as_deref(), Some("remote"));
        assert!(!cfg.hosts.contains_key("local"));
    }

    #[test]
    fn existing_home_file_wins_over_platform_dir() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join(HOME_FILE_NAME);
        let platform = dir.path().join("tm1ctl").join("config.json");

        assert_eq!(
            select_config_path(Some(home.clone()), Some(platform.clone())),
            platform
        );

        std::fs::write(&home, "{}").unwrap();
        assert_eq!(
            select_config_path(Some(home.clone()), Some(platform)),
            home
        );
        assert_eq!(select_config_path(None, None), PathBuf::from(HOME_FILE_NAME));
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut cfg = sample();
        cfg.use_instance(None, Some("prod1")).unwrap();
        save_config(&cfg, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.host.as_deref(), Some("local"));
        assert_eq!(loaded.user.as_deref(), Some("admin"));
        assert_eq!(loaded.hosts["local"]["instance"], json!("prod1"));
        assert_eq!(loaded.hosts["broken"], json!("not an object"));
        assert_eq!(loaded.users["admin"]["password"], json!("apple"));
    }

    #[test]
    fn load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn apply_field_sets_and_removes() {
        let mut entry = Entry::new();
        assert!(!apply_field(&mut entry, "name", None));
        assert!(apply_field(&mut entry, "name", Some("Admin")));
        assert_eq!(entry["name"], json!("Admin"));
        assert!(apply_field(&mut entry, "name", Some("")));
        assert!(!entry.contains_key("name"));
        assert!(!apply_field(&mut entry, "name", Some("")));
    }

    #[test]
    fn use_host_requires_configured_host() {
        let mut cfg = sample();

        let err = cfg.use_host(Some("elsewhere")).unwrap_err();
        assert!(matches!(err, ConfigError::NotDefined { kind: "host", .. }));
        assert_eq!(cfg.host.as_deref(), Some("local"));

        cfg.use_host(None).unwrap();
        assert_eq!(cfg.host, None);
    }

    #[test]
    fn delete_active_user_clears_selection() {
        let mut cfg = sample();
        cfg.delete_user("admin").unwrap();

        assert_eq!(cfg.user, None);
        assert!(cfg.users.is_empty());
        assert!(matches!(
            cfg.delete_user("admin"),
            Err(ConfigError::NotDefined { kind: "user", .. })
        ));
    }

    #[test]
    fn host_entry_mut_rejects_malformed_entry() {
        let mut cfg = sample();
        assert!(matches!(
            cfg.host_entry_mut("broken"),
            Err(ConfigError::Resolve(ResolveError::MalformedHostConfig { .. }))
        ));
        assert!(cfg.host_entry_mut("fresh").unwrap().is_empty());
    }

    #[test]
    fn use_instance_clears_with_none() {
        let mut cfg = sample();
        cfg.use_instance(Some("local"), Some("prod1")).unwrap();
        cfg.use_instance(Some("local"), None).unwrap();

        assert_eq!(cfg.hosts["local"]["instance"], json!(""));
    }

    #[test]
    fn set_user_variable_creates_variables_object() {
        let mut cfg = sample();
        let user = cfg
            .set_user_variable(None, "region", json!({ "code": "EU" }))
            .unwrap();

        assert_eq!(user, "admin");
        assert_eq!(cfg.users["admin"]["variables"]["region"]["code"], json!("EU"));
    }

    #[test]
    fn set_output_format_validates() {
        let mut cfg = sample();
        cfg.set_output_format("json").unwrap();
        assert_eq!(cfg.output_format, "json");
        assert!(cfg.set_output_format("xml").is_err());
    }

    #[test]
    fn service_root_url_validation() {
        validate_service_root_url("https://tm1.example.com:4444").unwrap();
        assert!(validate_service_root_url("localhost:4444").is_err());
        assert!(validate_service_root_url("ftp://example.com").is_err());
    }
}

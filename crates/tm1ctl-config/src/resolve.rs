//! Endpoint and credential resolution.
//!
//! Every lookup here follows one precedence rule, implemented once in
//! [`with_override`]: a non-empty explicit value beats a non-empty stored
//! value, and absence is a hard error for identity and location fields.
//! Nothing is cached; callers resolve against the [`Config`] snapshot of the
//! current invocation.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;

use tm1ctl_api::Authorization;

use crate::{Config, Entry};

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no host specified")]
    NoHostSpecified,

    #[error("no configuration specified for host '{host}'")]
    HostNotConfigured { host: String },

    #[error("invalid configuration for host '{host}', format invalid")]
    MalformedHostConfig { host: String },

    #[error("invalid configuration, no {field} specified for host '{host}'")]
    MissingField { field: HostField, host: String },

    #[error("invalid {field} format for host '{host}'")]
    InvalidField { field: HostField, host: String },

    #[error("no instance specified for host '{host}'")]
    NoInstanceSpecified { host: String },

    #[error("no database specified")]
    NoDatabaseSpecified,

    #[error("no user specified")]
    NoUserSpecified,

    #[error("invalid configuration for user '{user}', format invalid")]
    MalformedUserConfig { user: String },

    #[error("invalid {field} format for user '{user}'")]
    InvalidUserField { field: &'static str, user: String },
}

// ── Overrides ───────────────────────────────────────────────────────

/// Explicit values supplied for one invocation (flags or environment).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub instance: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub root_client_id: Option<String>,
    pub root_client_secret: Option<SecretString>,
}

// ── Precedence ──────────────────────────────────────────────────────

/// Treat empty strings as absent.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Explicit value if non-empty, otherwise the non-empty stored value.
///
/// The stored value is only looked up (and validated) when no explicit
/// value was given.
pub fn with_override<'a, E>(
    explicit: Option<&'a str>,
    stored: impl FnOnce() -> Result<Option<&'a str>, E>,
) -> Result<Option<&'a str>, E> {
    match non_empty(explicit) {
        Some(value) => Ok(Some(value)),
        None => stored().map(non_empty),
    }
}

/// Render an OData entity key, e.g. `Databases('Sales')`.
///
/// Single quotes inside the key are doubled.
pub fn entity_key(set: &str, key: &str) -> String {
    format!("{set}('{}')", key.replace('\'', "''"))
}

// ── Hosts ───────────────────────────────────────────────────────────

/// String fields of a host entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostField {
    ServiceRootUrl,
    RootClientId,
    RootClientSecret,
    Instance,
}

impl HostField {
    /// Key of the field in the host entry.
    pub fn key(self) -> &'static str {
        match self {
            Self::ServiceRootUrl => "service_root_url",
            Self::RootClientId => "root_client_id",
            Self::RootClientSecret => "root_client_secret",
            Self::Instance => "instance",
        }
    }
}

impl fmt::Display for HostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A configured host entry, borrowed from the config snapshot.
#[derive(Debug, Clone, Copy)]
pub struct HostConfig<'a> {
    name: &'a str,
    entry: &'a Entry,
}

impl<'a> HostConfig<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// A string field, `None` when absent. Non-string values are rejected.
    pub fn field(&self, field: HostField) -> Result<Option<&'a str>, ResolveError> {
        match self.entry.get(field.key()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(ResolveError::InvalidField {
                field,
                host: self.name.to_owned(),
            }),
        }
    }

    /// A required, non-empty string field, unless `explicit` supplies it.
    pub fn required(
        &self,
        field: HostField,
        explicit: Option<&'a str>,
    ) -> Result<&'a str, ResolveError> {
        with_override(explicit, || self.field(field))?.ok_or_else(|| ResolveError::MissingField {
            field,
            host: self.name.to_owned(),
        })
    }

    pub fn service_root_url(&self) -> Result<&'a str, ResolveError> {
        self.required(HostField::ServiceRootUrl, None)
    }

    pub fn root_client_id(&self) -> Result<&'a str, ResolveError> {
        self.required(HostField::RootClientId, None)
    }

    pub fn root_client_secret(&self) -> Result<&'a str, ResolveError> {
        self.required(HostField::RootClientSecret, None)
    }

    /// The host's active instance, if one is selected.
    pub fn instance(&self) -> Result<Option<&'a str>, ResolveError> {
        self.field(HostField::Instance).map(non_empty)
    }
}

pub fn resolve_host_name<'a>(
    config: &'a Config,
    host: Option<&'a str>,
) -> Result<&'a str, ResolveError> {
    with_override(host, || Ok(config.host.as_deref()))?.ok_or(ResolveError::NoHostSpecified)
}

pub fn resolve_host_config<'a>(
    config: &'a Config,
    host: Option<&'a str>,
) -> Result<HostConfig<'a>, ResolveError> {
    let name = resolve_host_name(config, host)?;
    match config.hosts.get(name) {
        None | Some(Value::Null) => Err(ResolveError::HostNotConfigured {
            host: name.to_owned(),
        }),
        Some(Value::Object(entry)) => Ok(HostConfig { name, entry }),
        Some(_) => Err(ResolveError::MalformedHostConfig {
            host: name.to_owned(),
        }),
    }
}

pub fn resolve_instance_name<'a>(
    host: &HostConfig<'a>,
    instance: Option<&'a str>,
) -> Result<&'a str, ResolveError> {
    with_override(instance, || host.instance())?.ok_or_else(|| ResolveError::NoInstanceSpecified {
        host: host.name().to_owned(),
    })
}

/// `{service_root_url}/manage/v1`
pub fn resolve_management_root_url(
    config: &Config,
    host: Option<&str>,
) -> Result<String, ResolveError> {
    let host = resolve_host_config(config, host)?;
    let root = host.service_root_url()?;
    Ok(format!("{}/manage/v1", root.trim_end_matches('/')))
}

/// `{service_root_url}/{instance}/api/v1`
pub fn resolve_instance_root_url(
    config: &Config,
    host: Option<&str>,
    instance: Option<&str>,
) -> Result<String, ResolveError> {
    let host = resolve_host_config(config, host)?;
    let instance = resolve_instance_name(&host, instance)?;
    let root = host.service_root_url()?;
    Ok(format!("{}/{instance}/api/v1", root.trim_end_matches('/')))
}

/// `{instance_root_url}/Databases('{database}')`
///
/// There is no stored default database; the caller always names it.
pub fn resolve_database_root_url(
    config: &Config,
    host: Option<&str>,
    instance: Option<&str>,
    database: Option<&str>,
) -> Result<String, ResolveError> {
    let instance_root = resolve_instance_root_url(config, host, instance)?;
    let database = non_empty(database).ok_or(ResolveError::NoDatabaseSpecified)?;
    Ok(format!(
        "{instance_root}/{}",
        entity_key("Databases", database)
    ))
}

/// Root (management) credentials of a host; explicit values win.
pub fn resolve_root_authorization(
    host: &HostConfig<'_>,
    client_id: Option<&str>,
    client_secret: Option<&SecretString>,
) -> Result<Authorization, ResolveError> {
    let id = host.required(HostField::RootClientId, client_id)?;
    let secret = host.required(
        HostField::RootClientSecret,
        client_secret.map(ExposeSecret::expose_secret),
    )?;
    Ok(Authorization::basic(id, secret))
}

// ── Users ───────────────────────────────────────────────────────────

/// A configured user entry, borrowed from the config snapshot.
#[derive(Debug, Clone, Copy)]
pub struct UserConfig<'a> {
    name: &'a str,
    entry: &'a Entry,
}

impl<'a> UserConfig<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    fn field(&self, field: &'static str) -> Result<Option<&'a str>, ResolveError> {
        match self.entry.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(ResolveError::InvalidUserField {
                field,
                user: self.name.to_owned(),
            }),
        }
    }

    /// Identity sent on the wire: the `name` field, else the entry key.
    pub fn identity(&self) -> Result<&'a str, ResolveError> {
        Ok(non_empty(self.field("name")?).unwrap_or(self.name))
    }

    pub fn password(&self) -> Result<Option<&'a str>, ResolveError> {
        self.field("password")
    }

    /// Session variables; must be a JSON object when present.
    pub fn variables(&self) -> Result<Option<&'a Entry>, ResolveError> {
        match self.entry.get("variables") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(vars)) => Ok(Some(vars)),
            Some(_) => Err(ResolveError::InvalidUserField {
                field: "variables",
                user: self.name.to_owned(),
            }),
        }
    }
}

pub fn resolve_user_name<'a>(
    config: &'a Config,
    user: Option<&'a str>,
) -> Result<&'a str, ResolveError> {
    with_override(user, || Ok(config.user.as_deref()))?.ok_or(ResolveError::NoUserSpecified)
}

/// The configured entry for the resolved user, `None` if it isn't configured.
pub fn resolve_user_config<'a>(
    config: &'a Config,
    user: Option<&'a str>,
) -> Result<Option<UserConfig<'a>>, ResolveError> {
    let name = resolve_user_name(config, user)?;
    match config.users.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(entry)) => Ok(Some(UserConfig { name, entry })),
        Some(_) => Err(ResolveError::MalformedUserConfig {
            user: name.to_owned(),
        }),
    }
}

/// End-user credentials.
///
/// A configured user supplies its wire identity and stored password; an
/// explicit password always wins. A name that matches no configured user is
/// used literally, with the explicit password (or none).
pub fn resolve_user_authorization(
    config: &Config,
    user: Option<&str>,
    password: Option<&SecretString>,
) -> Result<Authorization, ResolveError> {
    let password = password.map(ExposeSecret::expose_secret);

    let Some(entry) = resolve_user_config(config, user)? else {
        let name = resolve_user_name(config, user)?;
        return Ok(Authorization::basic(
            name,
            non_empty(password).unwrap_or_default(),
        ));
    };

    let identity = entry.identity()?;
    let secret = with_override(password, || entry.password())?.unwrap_or_default();
    Ok(Authorization::basic(identity, secret))
}

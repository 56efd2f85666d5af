//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text
//! and a process exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use tm1ctl_config::{ConfigError, ResolveError};
use tm1ctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFIG: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const LOCAL_FILE: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(tm1ctl::config),
        help(
            "Inspect the configuration with: tm1ctl host list / tm1ctl user list\n\
             Values can also be given per invocation, see: tm1ctl --help"
        )
    )]
    Resolve(#[from] ResolveError),

    #[error("{message}")]
    #[diagnostic(code(tm1ctl::config_file), help("Configuration file: {path}"))]
    ConfigFile { message: String, path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(tm1ctl::config), help("Check the host settings with: tm1ctl host list"))]
    Config { message: String },

    #[error("{kind} '{name}' is not defined")]
    #[diagnostic(code(tm1ctl::not_defined), help("Run: tm1ctl {list_command}"))]
    NotDefined {
        kind: &'static str,
        name: String,
        list_command: String,
    },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}: {reason}")]
    #[diagnostic(
        code(tm1ctl::connection_failed),
        help(
            "Check that the service is running and the host's service_root_url is right.\n\
             Self-signed certificate? Try --insecure (-k) or --ca-cert."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(code(tm1ctl::timeout), help("Increase the limit with --timeout."))]
    Timeout { url: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Authentication failed (HTTP {status}): {body}")]
    #[diagnostic(
        code(tm1ctl::auth_failed),
        help(
            "Verify the credentials in use.\n\
             Management calls use the host's root client id/secret, all others the user's."
        )
    )]
    AuthFailed { status: u16, body: String },

    #[error("Not found: {body}")]
    #[diagnostic(code(tm1ctl::not_found))]
    NotFound { body: String },

    #[error("Request failed (HTTP {status}): {body}")]
    #[diagnostic(code(tm1ctl::api_error))]
    Api { status: u16, body: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(tm1ctl::decode))]
    Decode { message: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Cannot read backup set '{}': {reason}", path.display())]
    #[diagnostic(code(tm1ctl::local_file))]
    LocalFile { path: PathBuf, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tm1ctl::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(tm1ctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(tm1ctl::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Resolve(_) | Self::ConfigFile { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NotDefined { .. } => exit_code::NOT_FOUND,
            Self::LocalFile { .. } => exit_code::LOCAL_FILE,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Configuration(e) => CliError::Resolve(e),

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Transport { url, timeout, .. } if timeout => CliError::Timeout { url },

            CoreError::Transport { url, reason, .. } => CliError::ConnectionFailed { url, reason },

            CoreError::Http { status, body } => match status {
                401 | 403 => CliError::AuthFailed { status, body },
                404 => CliError::NotFound { body },
                _ => CliError::Api { status, body },
            },

            CoreError::Decode { message, .. } => CliError::Decode { message },

            CoreError::LocalFile { path, reason } => CliError::LocalFile { path, reason },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Resolve(e) => CliError::Resolve(e),
            ConfigError::NotDefined { kind, name } => CliError::NotDefined {
                list_command: format!("{kind} list"),
                kind,
                name,
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

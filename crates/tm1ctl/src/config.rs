//! Glue between the global flags and the config/transport layers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tm1ctl_config::{Config, ConfigError, Overrides};
use tm1ctl_core::{RestClient, TlsMode, TransportConfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// `--config`, else the platform default location.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(tm1ctl_config::config_path)
}

/// Load the invocation's config snapshot.
///
/// The default location is initialized with the default document on first
/// use; a `--config` path is only read until something is saved to it.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    let loaded = if global.config.is_some() {
        tm1ctl_config::load_config(&path)
    } else {
        tm1ctl_config::load_or_init_config(&path)
    };
    loaded.map_err(|e| file_error(e, &path))
}

pub fn save(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_path(global);
    tm1ctl_config::save_config(cfg, &path).map_err(|e| file_error(e, &path))
}

fn file_error(err: ConfigError, path: &std::path::Path) -> CliError {
    CliError::ConfigFile {
        message: err.to_string(),
        path: path.display().to_string(),
    }
}

/// Explicit values from flags and environment.
pub fn overrides(global: &GlobalOpts, database: Option<&str>) -> Overrides {
    Overrides {
        host: global.host.clone(),
        instance: global.instance.clone(),
        database: database.map(str::to_owned),
        user: global.user.clone(),
        password: global
            .password
            .clone()
            .or_else(|| global.env_password.clone())
            .map(SecretString::from),
        root_client_id: global.client_id.clone(),
        root_client_secret: global.client_secret.clone().map(SecretString::from),
    }
}

/// The process-wide REST client.
pub fn rest_client(global: &GlobalOpts) -> Result<RestClient, CliError> {
    let tls = if global.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ca) = &global.ca_cert {
        TlsMode::CustomCa(ca.clone())
    } else {
        TlsMode::System
    };

    let transport = TransportConfig::default()
        .with_tls(tls)
        .with_timeout(global.timeout.map(Duration::from_secs));

    RestClient::new(&transport).map_err(|e| CliError::from(tm1ctl_core::CoreError::from(e)))
}

/// `--output`, else the configured default.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or(match cfg.output_format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    })
}

// ── Core error types ──
//
// Everything the facade and the restore workflow can fail with. The
// `From<tm1ctl_api::Error>` impl folds transport-layer errors into this
// taxonomy so consumers match on one enum.

use std::path::PathBuf;

use thiserror::Error;
use tm1ctl_config::{ConfigError, ResolveError};

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Resolution ───────────────────────────────────────────────────
    #[error(transparent)]
    Configuration(#[from] ResolveError),

    #[error("configuration error: {message}")]
    Config { message: String },

    // ── Wire ─────────────────────────────────────────────────────────
    #[error("cannot reach {url}: {reason}")]
    Transport {
        url: String,
        reason: String,
        timeout: bool,
    },

    #[error("request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected response: {message}")]
    Decode { message: String, body: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("cannot read backup set '{}': {reason}", path.display())]
    LocalFile { path: PathBuf, reason: String },
}

impl CoreError {
    /// HTTP status of a failed request, if the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

// ── Conversion from lower layers ────────────────────────────────────

impl From<tm1ctl_api::Error> for CoreError {
    fn from(err: tm1ctl_api::Error) -> Self {
        match err {
            tm1ctl_api::Error::Transport(e) => CoreError::Transport {
                url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                timeout: e.is_timeout(),
                reason: e.to_string(),
            },
            tm1ctl_api::Error::InvalidUrl { url, source } => CoreError::Config {
                message: format!("invalid URL '{url}': {source}"),
            },
            tm1ctl_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            tm1ctl_api::Error::InvalidAuthorization => CoreError::Config {
                message: "credentials contain characters not allowed in a header".into(),
            },
            tm1ctl_api::Error::Http { status, body } => CoreError::Http { status, body },
            tm1ctl_api::Error::Decode { message, body } => CoreError::Decode { message, body },
            tm1ctl_api::Error::FileOpen { path, source } => CoreError::LocalFile {
                path,
                reason: source.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Resolve(e) => CoreError::Configuration(e),
            other => CoreError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_keep_status() {
        let err = CoreError::from(tm1ctl_api::Error::Http {
            status: 404,
            body: "gone".into(),
        });
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn file_open_becomes_local_file() {
        let err = CoreError::from(tm1ctl_api::Error::FileOpen {
            path: PathBuf::from("backup.zip"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert!(matches!(err, CoreError::LocalFile { .. }));
        assert!(err.to_string().contains("backup.zip"));
    }

    #[test]
    fn resolve_errors_pass_through() {
        let err = CoreError::from(ConfigError::Resolve(ResolveError::NoDatabaseSpecified));
        assert!(matches!(
            err,
            CoreError::Configuration(ResolveError::NoDatabaseSpecified)
        ));
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `tm1ctl-api` crate.
///
/// HTTP-level failures are classified uniformly: any status of 400 or above
/// becomes [`Error::Http`] with the raw body attached. TM1 error payloads are
/// not interpreted here. `tm1ctl-core` maps these into user-facing categories.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The resolved URL could not be parsed.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// TLS setup failed while building the HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The Authorization value contains bytes that cannot go into a header.
    #[error("invalid authorization header value")]
    InvalidAuthorization,

    // ── Remote ──────────────────────────────────────────────────────
    /// The service answered with a status of 400 or above.
    #[error("error response (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The body was expected to be a JSON object but was not.
    #[error("failed to decode JSON: {message}")]
    Decode { message: String, body: String },

    // ── Local ───────────────────────────────────────────────────────
    /// The file to upload could not be opened.
    #[error("unable to open '{}': {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The HTTP status, if the service rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the service answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the service rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

use base64::{Engine as _, engine::general_purpose};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Value of the `Authorization` header sent with a request.
///
/// Computed per invocation from the resolved identity and never persisted.
/// The inner value is a [`SecretString`], so `Debug` output is redacted and
/// the header is marked sensitive when attached to a request.
#[derive(Debug, Clone, Default)]
pub struct Authorization(Option<SecretString>);

impl Authorization {
    /// `Basic base64(identity:secret)`.
    pub fn basic(identity: &str, secret: &str) -> Self {
        let encoded = general_purpose::STANDARD.encode(format!("{identity}:{secret}"));
        Self(Some(SecretString::from(format!("Basic {encoded}"))))
    }

    /// No `Authorization` header at all.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// The raw header value. Callers must not log it.
    pub fn expose(&self) -> Option<&str> {
        self.0.as_ref().map(ExposeSecret::expose_secret)
    }

    pub(crate) fn header_value(&self) -> Result<Option<HeaderValue>, Error> {
        let Some(raw) = self.expose() else {
            return Ok(None);
        };
        let mut value = HeaderValue::from_str(raw).map_err(|_| Error::InvalidAuthorization)?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

// REST client
//
// Wraps `reqwest::Client` with the request conventions the TM1 service
// expects: JSON in and out, Basic authorization, octet-stream uploads.
// Callers hand in fully resolved URLs; composing them is the job of the
// tiered facade in `tm1ctl-core`.

use std::path::Path;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Authorization;
use crate::error::Error;
use crate::transport::TransportConfig;

/// A decoded JSON object, as returned for single entities and collections.
pub type JsonObject = serde_json::Map<String, Value>;

/// Raw HTTP client for the TM1 REST API.
///
/// One instance is built per process so the cookie jar, and with it any
/// session affinity the service establishes, spans every call of an
/// invocation.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    chunk_size: usize,
}

impl RestClient {
    /// Build a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            chunk_size: transport.chunk_size,
        })
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    /// GET a JSON object.
    pub async fn get(&self, url: &str, auth: &Authorization) -> Result<JsonObject, Error> {
        debug!("GET {url}");

        let resp = self.request(Method::GET, url, auth)?.send().await?;
        let resp = check_status(resp).await?;
        decode_object(resp).await
    }

    /// POST a JSON payload. `204 No Content` yields `None`.
    pub async fn post(
        &self,
        url: &str,
        auth: &Authorization,
        payload: &Value,
    ) -> Result<Option<JsonObject>, Error> {
        debug!("POST {url}");

        let resp = self
            .request(Method::POST, url, auth)?
            .json(payload)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        decode_object(resp).await.map(Some)
    }

    /// PUT the raw bytes of a local file, streamed in `chunk_size` reads.
    ///
    /// Returns the number of bytes sent.
    pub async fn put_file(
        &self,
        url: &str,
        auth: &Authorization,
        path: &Path,
    ) -> Result<u64, Error> {
        let file_open = |source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(file_open)?;
        let len = file.metadata().await.map_err(file_open)?.len();

        debug!(bytes = len, chunk_size = self.chunk_size, "PUT {url}");

        let stream = ReaderStream::with_capacity(file, self.chunk_size);
        let resp = self
            .request(Method::PUT, url, auth)?
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, len)
            .body(Body::wrap_stream(stream))
            .send()
            .await?;
        check_status(resp).await?;

        Ok(len)
    }

    /// DELETE a resource.
    pub async fn delete(&self, url: &str, auth: &Authorization) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.request(Method::DELETE, url, auth)?.send().await?;
        check_status(resp).await?;
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn request(
        &self,
        method: Method,
        url: &str,
        auth: &Authorization,
    ) -> Result<RequestBuilder, Error> {
        let parsed = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;

        let mut builder = self
            .http
            .request(method, parsed)
            .header(ACCEPT, "application/json");
        if let Some(value) = auth.header_value()? {
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }
}

/// Turn any status of 400 or above into `Error::Http`, keeping the raw body.
async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_client_error() || status.is_server_error() {
        let body = resp.text().await.unwrap_or_default();
        trace!(status = status.as_u16(), "error response body: {body}");
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

async fn decode_object(resp: Response) -> Result<JsonObject, Error> {
    let body = resp.text().await?;
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::Decode {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
            body,
        }),
        Err(e) => Err(Error::Decode {
            message: e.to_string(),
            body,
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

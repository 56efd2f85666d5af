// tm1ctl-api: authenticated REST client for the TM1 v12 service API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;

pub use auth::Authorization;
pub use client::{JsonObject, RestClient};
pub use error::Error;
pub use transport::{DEFAULT_CHUNK_SIZE, TlsMode, TransportConfig};

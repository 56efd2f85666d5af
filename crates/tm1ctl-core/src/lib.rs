// tm1ctl-core: tiered access to the TM1 service API and the workflows
// built on top of it. Consumers (the CLI) resolve a tier from the loaded
// config snapshot and call into it; nothing here reads or writes the
// config file.

pub mod api;
pub mod error;
pub mod odata;
pub mod restore;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::{DatabaseApi, InstanceApi, ManagementApi};
pub use error::CoreError;
pub use restore::{FolderCheck, Restore, RestoreReport, RestoreStage};
pub use tm1ctl_api::{JsonObject, RestClient, TlsMode, TransportConfig};
pub use tm1ctl_config::{Config, Overrides};

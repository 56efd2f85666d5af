//! Command dispatch: bridges CLI args -> config/core calls -> output formatting.

pub mod config_cmd;
pub mod database;
pub mod host;
pub mod instance;
pub mod restore;
pub mod user;
pub mod util;

use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a command against the invocation's config snapshot.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;
    let format = config::output_format(global, &cfg);
    debug!(path = %config::config_path(global).display(), ?format, "configuration loaded");

    match cmd {
        Command::Host(args) => host::handle(args, &mut cfg, global, format),
        Command::User(args) => user::handle(args, &mut cfg, global, format),
        Command::Instance(args) => instance::handle(args, &mut cfg, global, format).await,
        Command::Database(args) => database::handle(args, &cfg, global, format).await,
        Command::Restore(args) => restore::handle(args, &cfg, global).await,
        Command::Config(args) => config_cmd::handle(args, &mut cfg, global, format),
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}

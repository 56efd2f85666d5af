//! Clap derive structures for the `tm1ctl` CLI.
//!
//! Only depends on clap and clap_complete so `build.rs` can include it to
//! render man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tm1ctl -- manage TM1 v12 services from the command line
#[derive(Debug, Parser)]
#[command(
    name = "tm1ctl",
    version,
    about = "Manage TM1 v12 services from the command line",
    long_about = "Manage the hosts, instances and databases of TM1 v12 services.\n\n\
        Hosts and users are kept in a local configuration file; any stored\n\
        value can be overridden per invocation with flags or TM1CTL_* variables.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file to use instead of the platform default
    #[arg(long, env = "TM1CTL_CONFIG", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Host to use instead of the active host
    #[arg(long, env = "TM1CTL_HOST", global = true)]
    pub host: Option<String>,

    /// Instance to use instead of the host's active instance
    #[arg(long, short = 'i', env = "TM1CTL_INSTANCE", global = true)]
    pub instance: Option<String>,

    /// User to use instead of the active user
    #[arg(long, short = 'u', env = "TM1CTL_USER", global = true)]
    pub user: Option<String>,

    /// Password for the user, for this invocation only [env: TM1CTL_PASSWORD]
    #[arg(long, short = 'p', global = true)]
    pub password: Option<String>,

    // Not global: a global env value would leak into `user set --password`.
    #[arg(long = "env-password", env = "TM1CTL_PASSWORD", hide = true, hide_env_values = true)]
    pub env_password: Option<String>,

    /// Root client id for management calls
    #[arg(long, env = "TM1CTL_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Root client secret for management calls
    #[arg(long, env = "TM1CTL_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// Output format (defaults to the configured output-format)
    #[arg(long, short = 'o', env = "TM1CTL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "TM1CTL_INSECURE", global = true)]
    pub insecure: bool,

    /// PEM file with an additional CA certificate
    #[arg(long, env = "TM1CTL_CA_CERT", value_name = "PATH", global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds (no timeout by default)
    #[arg(long, env = "TM1CTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table with one column per property
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the configured hosts
    Host(HostArgs),

    /// Manage the configured users
    User(UserArgs),

    /// Manage the instances of a TM1 v12 service
    #[command(alias = "inst")]
    Instance(InstanceArgs),

    /// Manage the databases of an instance
    #[command(alias = "db")]
    Database(DatabaseArgs),

    /// Restore a database from a local backup set
    Restore(RestoreArgs),

    /// Show or change general settings
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Host ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HostArgs {
    #[command(subcommand)]
    pub command: HostCommand,
}

#[derive(Debug, Subcommand)]
pub enum HostCommand {
    /// List the configured hosts, or show one
    #[command(alias = "ls")]
    List {
        /// Host to show
        name: Option<String>,
    },

    /// Add a host or update its settings
    Set(HostSetArgs),

    /// Make a host the active one, or clear the selection
    Use {
        /// Host to activate; omit to clear
        name: Option<String>,
    },

    /// Remove a host from the configuration
    #[command(alias = "rm")]
    Delete {
        /// Host to remove
        name: String,
    },
}

/// An empty value removes the setting.
#[derive(Debug, Args)]
pub struct HostSetArgs {
    /// Host to add or update
    pub name: String,

    /// Base URL of the service, e.g. https://tm1.example.com:4444
    #[arg(long)]
    pub service_root_url: Option<String>,

    /// Client id used for management calls
    #[arg(long)]
    pub root_client_id: Option<String>,

    /// Client secret used for management calls
    #[arg(long, conflicts_with = "prompt_root_client_secret")]
    pub root_client_secret: Option<String>,

    /// Prompt for the root client secret
    #[arg(long)]
    pub prompt_root_client_secret: bool,
}

// ── User ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List the configured users, or show one
    #[command(alias = "ls")]
    List {
        /// User to show
        name: Option<String>,
    },

    /// Add a user or update its settings
    Set(UserSetArgs),

    /// Make a user the active one, or clear the selection
    Use {
        /// User to activate; omit to clear
        name: Option<String>,
    },

    /// Remove a user from the configuration
    #[command(alias = "rm")]
    Delete {
        /// User to remove
        name: String,
    },

    /// Manage the session variables of a user
    #[command(alias = "var")]
    Variable(VariableArgs),
}

/// An empty value removes the setting.
#[derive(Debug, Args)]
pub struct UserSetArgs {
    /// User to add or update
    pub name: String,

    /// Name sent to the service, if it differs from the configured one
    #[arg(long = "name", id = "identity", value_name = "NAME")]
    pub identity: Option<String>,

    /// Password to store with the user
    ///
    /// Takes the place of the global --password here; TM1CTL_PASSWORD is
    /// never stored.
    #[arg(long, short = 'p', conflicts_with = "prompt_password")]
    pub password: Option<String>,

    /// Prompt for the password to store
    #[arg(long)]
    pub prompt_password: bool,

    /// Session variables as a JSON object
    #[arg(long, value_name = "JSON")]
    pub variables: Option<String>,
}

#[derive(Debug, Args)]
pub struct VariableArgs {
    #[command(subcommand)]
    pub command: VariableCommand,
}

#[derive(Debug, Subcommand)]
pub enum VariableCommand {
    /// List the variables of the user, or show one
    #[command(alias = "ls")]
    List {
        /// Variable to show
        key: Option<String>,
    },

    /// Set a variable; the value is parsed as JSON, else taken as a string
    Set {
        /// Variable to set
        key: String,
        /// New value
        value: String,
    },
}

// ── Instance ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InstanceArgs {
    #[command(subcommand)]
    pub command: InstanceCommand,
}

#[derive(Debug, Subcommand)]
pub enum InstanceCommand {
    /// List the instances of the host, or show one
    #[command(alias = "ls")]
    List {
        /// Instance to show
        name: Option<String>,
    },

    /// Create an instance
    Create {
        /// Instance to create
        name: String,
    },

    /// Delete an instance with all its databases
    #[command(alias = "rm")]
    Delete {
        /// Instance to delete
        name: String,
    },

    /// Make an instance the host's active one, or clear the selection
    Use {
        /// Instance to activate; omit to clear
        name: Option<String>,
    },
}

// ── Database ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DatabaseArgs {
    #[command(subcommand)]
    pub command: DatabaseCommand,
}

#[derive(Debug, Subcommand)]
pub enum DatabaseCommand {
    /// List the databases of the instance
    #[command(alias = "ls")]
    List,

    /// Show a database
    Get {
        /// Database to show
        name: String,
    },

    /// Create a database
    Create {
        /// Database to create
        name: String,
    },

    /// Delete a database with all its artifacts
    #[command(alias = "rm")]
    Delete {
        /// Database to delete
        name: String,
    },
}

// ── Restore ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Local backup set file
    pub backupset: PathBuf,

    /// Database to restore into
    #[arg(long, short = 'd', env = "TM1CTL_DATABASE")]
    pub database: String,

    /// Only create the staging folder when the service reports it missing
    #[arg(long)]
    pub strict_folder_check: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the active settings, or one of them
    #[command(alias = "ls")]
    List {
        /// Setting to show
        key: Option<ConfigKey>,
    },

    /// Change a setting
    Set {
        /// Setting to change
        key: SettableKey,
        /// New value
        value: String,
    },

    /// Print the path of the configuration file
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    Host,
    Instance,
    User,
    OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettableKey {
    OutputFormat,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! CLI entry point for devicegrant.

pub mod auth;

use clap::{Parser, Subcommand};

/// Device authorization grant CLI
#[derive(Parser, Debug)]
#[command(name = "devicegrant", version, about = "OAuth 2.0 device authorization client")]
pub struct Cli {
    /// Log level filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize this device with the auth server
    Login(LoginArgs),
    /// Show the identity behind an access token
    Whoami(WhoamiArgs),
}

/// Arguments for `devicegrant login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Auth server base URL (falls back to DEVICEGRANT_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// OAuth client identifier
    #[arg(long)]
    pub client_id: Option<String>,

    /// Space-separated scopes to request
    #[arg(long)]
    pub scope: Option<String>,

    /// Overall polling timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Extra attempts for the initial device-code request on transient errors
    #[arg(long, default_value_t = 2)]
    pub retries: u32,
}

/// Arguments for `devicegrant whoami`.
#[derive(Parser, Debug)]
pub struct WhoamiArgs {
    /// Access token to inspect
    #[arg(long)]
    pub token: String,

    /// Auth server base URL (falls back to DEVICEGRANT_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,
}

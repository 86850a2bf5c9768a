//! CLI command definitions for the `mchat` binary.
//!
//! Uses clap derive macros for argument parsing. Account administration
//! lives under `mchat user`, the HTTP server under `mchat serve`.

pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Membership chat backend: REST server and account administration.
#[derive(Parser)]
#[command(name = "mchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (default from config.toml or PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config.toml or MEMBERCHAT_HOST).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage member accounts (create, list, passwd).
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

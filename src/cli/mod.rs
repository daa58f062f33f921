//! CLI interface for sessiongate

pub mod commands;
mod output;

pub use output::*;

use crate::auth::RequiredLevel;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sessiongate")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Inspect and manage the persisted client session", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new sessiongate.toml configuration file
    Init,

    /// Show the stored session
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Replace the stored session with a new token and user
    Login {
        /// Auth token issued by the backend
        #[arg(short, long, env = "SESSIONGATE_TOKEN")]
        token: String,

        /// Backend user id
        #[arg(long)]
        id: i64,

        /// User email
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Backend role tag, e.g. "customer" or "pharmacist"
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Clear the stored session
    Logout,

    /// Edit profile fields of the stored user
    UpdateProfile {
        /// New display name
        #[arg(short, long)]
        name: Option<String>,

        /// New email
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Evaluate the route guard against the stored session
    Check {
        /// Level to check; all levels when omitted
        #[arg(short, long)]
        level: Option<RequiredLevel>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

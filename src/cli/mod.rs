//! Command-line interface for Rateboard.
//!
//! Serving the API is the default; the remaining commands are small
//! administrative tools that work directly against the configured database.

mod commands;

use clap::{Parser, Subcommand};

/// Rateboard - store ratings with role-based access
#[derive(Parser)]
#[command(name = "rateboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web API server
    #[command(alias = "web", alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// 8-16 characters with an uppercase letter and a special character
        #[arg(long)]
        password: String,

        #[arg(long, default_value = "Head office")]
        address: String,
    },

    /// List registered users
    #[command(alias = "ls")]
    Users {
        /// Filter by role label, e.g. "Store Owner"
        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value = "1")]
        page: u64,
    },

    /// Print total users, stores and ratings
    Stats,
}

pub use commands::*;

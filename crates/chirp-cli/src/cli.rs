use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chirp", about = "chirp: posts, accounts, and a like ledger over HTTP", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Create or upgrade the database schema
    Migrate(StorageArgs),
    /// Print the effective configuration (secret redacted)
    Config(ConfigArgs),
    /// Check that no (user, post) pair has more than one active like
    Audit(StorageArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct StorageArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// SQLite URL, e.g. sqlite://chirp.db
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub storage: StorageArgs,
    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
    /// Keep everything in memory instead of SQLite
    #[arg(long, conflicts_with = "database_url")]
    pub in_memory: bool,
    /// Return raw storage errors in 500 responses
    #[arg(long)]
    pub expose_internal_errors: bool,
}

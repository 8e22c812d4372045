use std::path::PathBuf;

use clap::Parser;

pub mod op;
pub mod ops;

pub use ops::Command;

#[derive(Parser, Debug)]
#[command(name = "mailblob", version, about = "Deduplicating blob store for mail payloads")]
pub struct Args {
    /// State directory holding config.toml and index.db (default: ~/.mailblob)
    #[arg(long, env = "MAILBLOB_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

//! MonoKV CLI
//!
//! Command-line tools for MonoKV store files.
//!
//! # Commands
//!
//! - `get` / `set` / `remove` - Single-key operations
//! - `keys` - List live keys in insertion order
//! - `dump` - Print every record in the log
//! - `inspect` - Display log statistics
//! - `compact` - Compact the log to reclaim space

mod commands;

use clap::{Parser, Subcommand};
use monokv_core::StoreConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// MonoKV command-line store tools.
#[derive(Parser)]
#[command(name = "monokv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store's log file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Extension applied when the path has none
    #[arg(global = true, short, long)]
    extension: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored for a key
    Get {
        /// The key to read
        key: String,

        /// Report a missing key as "(no value)" instead of failing
        #[arg(long)]
        no_strict: bool,
    },

    /// Store a value for a key, replacing any existing one
    Set {
        /// The key to write
        key: String,

        /// The value to store
        value: String,
    },

    /// Remove a key (a no-op if it does not exist)
    Remove {
        /// The key to remove
        key: String,
    },

    /// List live keys in insertion order
    Keys,

    /// Print every record in the log as `key: value` lines
    Dump {
        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Display log statistics
    Inspect,

    /// Compact the log to reclaim space
    Compact,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = |path: Option<PathBuf>| -> Result<StoreConfig, Box<dyn std::error::Error>> {
        let path = path.ok_or("Store path required (--path)")?;
        let mut config = StoreConfig::new(path);
        if let Some(extension) = &cli.extension {
            config = config.default_extension(extension);
        }
        Ok(config)
    };

    match &cli.command {
        Commands::Get { key, no_strict } => {
            commands::get::run(config(cli.path.clone())?, key, !no_strict)?;
        }
        Commands::Set { key, value } => {
            commands::set::run(config(cli.path.clone())?, key, value)?;
        }
        Commands::Remove { key } => {
            commands::remove::run(config(cli.path.clone())?, key)?;
        }
        Commands::Keys => {
            commands::keys::run(config(cli.path.clone())?)?;
        }
        Commands::Dump { limit } => {
            let resolved = config(cli.path.clone())?.resolved_path();
            commands::dump::run(&resolved, *limit)?;
        }
        Commands::Inspect => {
            let resolved = config(cli.path.clone())?.resolved_path();
            commands::inspect::run(&resolved)?;
        }
        Commands::Compact => {
            commands::compact::run(config(cli.path.clone())?)?;
        }
        Commands::Version => {
            println!("MonoKV CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("MonoKV Core v{}", monokv_core::VERSION);
        }
    }

    Ok(())
}

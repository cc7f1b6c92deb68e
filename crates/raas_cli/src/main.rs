//! RAAS CLI
//!
//! Command-line tools for the raw active alarms store.
//!
//! # Commands
//!
//! - `put` / `delete` - Write or delete one alarm
//! - `get-pack` - Read one pack
//! - `snapshot` - Traverse all packs and print the active alarms
//! - `subpartitions` - List the partition's subpartitions
//! - `dump-log` - Dump raw log records for debugging
//! - `expire` - Drop records older than the retention
//! - `patch` - Merge a partial JSON value onto a previous one

mod commands;

use clap::{Parser, Subcommand};
use commands::StoreArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Raw active alarms store tools.
#[derive(Parser)]
#[command(name = "raas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend to run on (log, reference)
    #[arg(global = true, short, long, default_value = "log")]
    backend: String,

    /// Path to the log directory (log backend)
    #[arg(global = true, short = 'p', long)]
    log_dir: Option<PathBuf>,

    /// Partition domain
    #[arg(global = true, long, default_value = "default")]
    domain: String,

    /// Partition adapter name
    #[arg(global = true, long, default_value = "default")]
    adapter: String,

    /// Subpartitions of newly created partitions
    #[arg(global = true, long, default_value = "1")]
    subpartitions: u32,

    /// Record retention in seconds (defaults to the staleness window)
    #[arg(global = true, long)]
    retention_secs: Option<u64>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or replace an alarm
    Put {
        /// Notification identifier
        id: String,

        /// Alarm value (JSON object)
        value: String,

        /// Subpartition to write
        #[arg(short, long, default_value = "0")]
        subpartition: String,
    },

    /// Delete an alarm
    Delete {
        /// Notification identifier
        id: String,

        /// Subpartition to write
        #[arg(short, long, default_value = "0")]
        subpartition: String,
    },

    /// Read one pack
    GetPack {
        /// Subpartition to read
        #[arg(short, long, default_value = "0")]
        subpartition: String,

        /// Cursor returned by the previous pack
        #[arg(short, long)]
        cursor: Option<String>,

        /// Maximum pack size
        #[arg(short = 'n', long, default_value = "100")]
        how_many: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Traverse every pack and print the reconstructed active alarms
    Snapshot {
        /// Subpartition to read
        #[arg(short, long, default_value = "0")]
        subpartition: String,

        /// Pack size used for the traversal
        #[arg(short = 'n', long, default_value = "100")]
        page: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the partition's subpartitions
    Subpartitions,

    /// Dump raw log records for debugging
    DumpLog {
        /// Subpartition to dump
        #[arg(short, long, default_value = "0")]
        subpartition: String,

        /// Start from this offset
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Drop log records older than the retention
    Expire,

    /// Merge a partial JSON value onto a previous one
    Patch {
        /// Previous value (JSON object)
        previous: String,

        /// New attributes (JSON object)
        update: String,
    },

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
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = StoreArgs {
        backend: cli.backend.parse()?,
        log_dir: cli.log_dir,
        domain: cli.domain,
        adapter: cli.adapter,
        subpartitions: cli.subpartitions,
        retention_secs: cli.retention_secs,
    };

    match cli.command {
        Commands::Put {
            id,
            value,
            subpartition,
        } => {
            commands::alarms::put(&args, &subpartition, &id, &value)?;
        }
        Commands::Delete { id, subpartition } => {
            commands::alarms::delete(&args, &subpartition, &id)?;
        }
        Commands::GetPack {
            subpartition,
            cursor,
            how_many,
            format,
        } => {
            commands::alarms::get_pack(&args, &subpartition, cursor, how_many, &format)?;
        }
        Commands::Snapshot {
            subpartition,
            page,
            format,
        } => {
            commands::snapshot::run(&args, &subpartition, page, &format)?;
        }
        Commands::Subpartitions => {
            commands::alarms::subpartitions(&args)?;
        }
        Commands::DumpLog {
            subpartition,
            offset,
            limit,
            format,
        } => {
            commands::dump_log::run(&args, &subpartition, offset, limit, &format)?;
        }
        Commands::Expire => {
            commands::expire::run(&args)?;
        }
        Commands::Patch { previous, update } => {
            commands::patch::run(&previous, &update)?;
        }
        Commands::Version => {
            println!("RAAS CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RAAS Core v{}", raas_core::VERSION);
        }
    }

    Ok(())
}

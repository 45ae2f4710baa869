//! Replifile CLI
//!
//! Command-line tools for mirrored files.
//!
//! # Commands
//!
//! - `mirror` - Write a file through a replica set
//! - `verify` - Read a replica set back through verified reads
//! - `compare` - Count differing bytes between two files
//! - `audit` - Compare every replica with its primary

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use replifile_core::{Config, DEFAULT_COMPARE_CHUNK_SIZE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replifile command-line tools.
#[derive(Parser)]
#[command(name = "replifile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a file to a primary and its replicas
    Mirror {
        /// File to copy
        input: PathBuf,

        /// Primary destination
        #[arg(short, long)]
        primary: PathBuf,

        /// Replica destination (repeat up to five times)
        #[arg(short, long = "replica")]
        replicas: Vec<PathBuf>,

        /// Bytes per write
        #[arg(short, long, default_value_t = DEFAULT_COMPARE_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Read a primary and its replicas back and check they agree
    Verify {
        /// Primary file
        #[arg(short, long)]
        primary: PathBuf,

        /// Replica file (repeat up to five times)
        #[arg(short, long = "replica")]
        replicas: Vec<PathBuf>,

        /// Bytes per verified read
        #[arg(short, long, default_value_t = DEFAULT_COMPARE_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Count the byte positions at which two files differ
    Compare {
        /// First file
        left: PathBuf,

        /// Second file
        right: PathBuf,

        /// Maximum number of differences to list
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Bytes read from each file per comparison step
        #[arg(short, long, default_value_t = DEFAULT_COMPARE_CHUNK_SIZE)]
        chunk_size: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Compare each replica with the primary
    Audit {
        /// Primary file
        primary: PathBuf,

        /// Replica files
        #[arg(required = true)]
        replicas: Vec<PathBuf>,

        /// Bytes read from each file per comparison step
        #[arg(short, long, default_value_t = DEFAULT_COMPARE_CHUNK_SIZE)]
        chunk_size: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
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

    match cli.command {
        Commands::Mirror {
            input,
            primary,
            replicas,
            chunk_size,
        } => {
            commands::mirror::run(&input, &primary, &replicas, chunk_size)?;
        }
        Commands::Verify {
            primary,
            replicas,
            chunk_size,
        } => {
            commands::verify::run(&primary, &replicas, chunk_size)?;
        }
        Commands::Compare {
            left,
            right,
            limit,
            chunk_size,
            format,
        } => {
            let config = Config::new().compare_chunk_size(chunk_size);
            commands::compare::run(&config, &left, &right, limit, format)?;
        }
        Commands::Audit {
            primary,
            replicas,
            chunk_size,
            format,
        } => {
            let config = Config::new().compare_chunk_size(chunk_size);
            commands::audit::run(&config, &primary, &replicas, format)?;
        }
        Commands::Version => {
            println!("Replifile CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Replifile Core v{}", replifile_core::VERSION);
        }
    }

    Ok(())
}

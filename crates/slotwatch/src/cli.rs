use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slotwatch")]
#[command(version)]
#[command(about = "Watch appointment availability and notify once per new slot")]
pub struct Cli {
    /// Config file (defaults to config.json in the data directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll all targets until interrupted
    Run,

    /// Run a single cycle and print its report as JSON
    Once,

    /// Show dedup store statistics
    Status,

    /// Remove dedup records older than the retention horizon
    Evict {
        /// Horizon in days (defaults to the full queried window plus one day)
        #[arg(long)]
        days: Option<u32>,
    },

    /// View cycle history
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,

        /// Number of recent cycles to list
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Validate the config file and list the page URLs it would query
    CheckConfig,

    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// platelight - locate and illuminate sample wells on storage plates
#[derive(Parser)]
#[command(name = "platelight")]
#[command(about = "Walk compound requests plate by plate, lighting wells on an LED panel")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: log frames instead of opening serial ports.
    ///
    /// Every send is reported successful, so the full navigation flow can
    /// be exercised without panel hardware.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a request CSV and report any format errors
    Validate {
        /// Path to the request CSV (header line is skipped)
        requests: PathBuf,
    },
    /// Write the binary well map (.syrup) for a request CSV
    Export {
        /// Path to the request CSV
        requests: PathBuf,
        /// Output path for the well map
        #[arg(short, long)]
        out: PathBuf,
        /// Path to a deployment settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// List serial ports visible on this machine
    Ports,
    /// Walk the sorted requests plate by plate, lighting wells
    Guide {
        /// Path to the request CSV
        requests: PathBuf,
        /// Path to the ports file (first line = primary panel)
        #[arg(short, long)]
        ports: Option<PathBuf>,
        /// Path to a deployment settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

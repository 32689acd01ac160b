//! Command-line surface: `serverd --config <path> [--cpuprofile <path>]`.
//!
//! The teacher's binary takes no flags at all (`dotenvy::dotenv().ok()` is
//! implicit); this crate's spec names an explicit `--config` flag and a
//! `--cpuprofile` flamegraph hook, so `clap`'s derive API is introduced here
//! rather than hand-parsing `std::env::args()`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "serverd", about = "Wallet ledger server")]
pub struct Cli {
    /// Path to an env-file to load configuration from before reading the
    /// process environment.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// When set, captures a CPU profile for the process lifetime and writes
    /// a flamegraph to this path on shutdown.
    #[arg(long)]
    pub cpuprofile: Option<PathBuf>,
}

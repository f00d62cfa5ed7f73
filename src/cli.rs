use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed wedding timeline coordinator.
/// Storage defaults to the most recent wedding under ~/.wtm, or a path passed via --db.
#[derive(Parser)]
#[command(name = "wtm", version, about = "Wedding timeline management CLI")]
pub struct Cli {
    /// Path to the JSON store file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

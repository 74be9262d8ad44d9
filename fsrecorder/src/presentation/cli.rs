use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Filesystem recording and replay tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record filesystem changes under a directory into an archive
    Record {
        /// Directory to monitor
        directory: PathBuf,

        /// Output recording file (.tar.gz)
        #[arg(short, long)]
        output: PathBuf,

        /// Replace binary files with empty placeholders (default)
        #[arg(long, overrides_with = "no_skip_binary_content")]
        skip_binary_content: bool,

        /// Store full content of binary files
        #[arg(long)]
        no_skip_binary_content: bool,

        /// File extensions to always treat as text (e.g. dm dat)
        #[arg(long, num_args = 0..)]
        force_text_extensions: Vec<String>,

        /// File extensions to always treat as binary (e.g. log txt)
        #[arg(long, num_args = 0..)]
        force_binary_extensions: Vec<String>,
    },

    /// Replay a recording into a target directory
    Replay {
        /// Recording file to replay (.tar.gz or legacy .json)
        recording: PathBuf,

        /// Target directory for replay
        target: PathBuf,

        /// Speed multiplier for custom mode
        #[arg(short, long, default_value_t = 1.0)]
        speed: f64,

        /// Maximum delay between events in seconds
        #[arg(long)]
        max_delay: Option<f64>,

        /// Burst mode: process events as fast as possible
        #[arg(long)]
        burst: bool,

        /// Maximum acceleration for rapid iteration and smoke tests
        #[arg(long, conflicts_with_all = ["fast", "exact"])]
        dev_mode: bool,

        /// Balanced acceleration: 100x speed with 1s delay cap (default)
        #[arg(long, conflicts_with = "exact")]
        fast: bool,

        /// Preserve original timing exactly (1x speed)
        #[arg(long)]
        exact: bool,

        /// Skip integrity verification
        #[arg(long)]
        no_verify: bool,

        /// Skip creating files that were unreadable during recording
        #[arg(long)]
        skip_unreadable: bool,
    },

    /// Show information about a recording
    Info {
        /// Recording file to analyze (.tar.gz or legacy .json)
        recording: PathBuf,
    },
}

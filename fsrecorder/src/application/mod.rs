pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use fsrecorder_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Record {
            directory,
            output,
            skip_binary_content: _,
            no_skip_binary_content,
            force_text_extensions,
            force_binary_extensions,
        } => handlers::handle_record(
            directory,
            output,
            !no_skip_binary_content,
            force_text_extensions,
            force_binary_extensions,
        ),
        Commands::Replay {
            recording,
            target,
            speed,
            max_delay,
            burst,
            dev_mode,
            fast,
            exact,
            no_verify,
            skip_unreadable,
        } => handlers::handle_replay(
            recording,
            target,
            handlers::resolve_policy(speed, max_delay, burst, dev_mode, fast, exact),
            !no_verify,
            skip_unreadable,
        ),
        Commands::Info { recording } => handlers::handle_info(recording),
    }
}

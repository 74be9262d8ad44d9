use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fsrecorder_core::error::Result;
use fsrecorder_core::{
    Recorder, RecorderOptions, ReplayOptions, Replayer, TimePolicy, info,
};

/// Named modes dominate the custom knobs; with nothing explicit the
/// engine runs in fast mode.
pub fn resolve_policy(
    speed: f64,
    max_delay: Option<f64>,
    burst: bool,
    dev_mode: bool,
    fast: bool,
    exact: bool,
) -> TimePolicy {
    if dev_mode {
        return TimePolicy::Dev;
    }
    if fast {
        return TimePolicy::Fast;
    }
    if exact {
        return TimePolicy::Exact;
    }
    if burst {
        return TimePolicy::Burst;
    }
    if speed != 1.0 || max_delay.is_some() {
        return TimePolicy::Custom { speed, max_delay };
    }
    TimePolicy::Fast
}

pub fn handle_record(
    directory: PathBuf,
    output: PathBuf,
    skip_binary_content: bool,
    force_text_extensions: Vec<String>,
    force_binary_extensions: Vec<String>,
) -> Result<()> {
    if skip_binary_content {
        println!("Binary content handling: skip binary files (replace with placeholders)");
        if !force_text_extensions.is_empty() {
            println!("Force text extensions: {}", force_text_extensions.join(", "));
        }
        if !force_binary_extensions.is_empty() {
            println!(
                "Force binary extensions: {}",
                force_binary_extensions.join(", ")
            );
        }
    } else {
        println!("Binary content handling: store full content of all files");
    }

    println!("Capturing initial state of {}", directory.display());
    let options = RecorderOptions {
        skip_binary_content,
        force_text_extensions,
        force_binary_extensions,
    };
    let mut recorder = Recorder::new(&directory, &output, options)?;

    println!("Recording {} events from initial state", recorder.events().len());
    println!("Recording will be saved to {}", output.display());
    println!("Press Ctrl+C to stop recording");

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    // A notifier failure still seals what was captured so far.
    let run_result = recorder.run_until(&stop);
    if let Err(e) = &run_result {
        eprintln!("Recording stopped: {e}");
    }

    println!("\nStopping recording...");
    recorder.seal()?;
    println!("Recording saved to {}", output.display());
    println!("Captured {} events", recorder.events().len());

    let unreadable = recorder.unreadable_report();
    if unreadable.is_empty() {
        println!("\nAll files were readable during recording.");
    } else {
        println!("\nUnreadable files report ({} files):", unreadable.len());
        for path in &unreadable {
            println!("  - {path}");
        }
        println!(
            "\nNote: these files were tracked but their content could not be read \
             due to permission restrictions."
        );
    }

    let placeholders = recorder.placeholder_report();
    if !placeholders.is_empty() {
        println!(
            "\nBinary placeholder files report ({} files):",
            placeholders.len()
        );
        for path in &placeholders {
            println!("  - {path}");
        }
        println!(
            "\nNote: these binary files were replaced with empty placeholders \
             to reduce archive size."
        );
    }

    run_result
}

pub fn handle_replay(
    recording: PathBuf,
    target: PathBuf,
    policy: TimePolicy,
    verify: bool,
    skip_unreadable: bool,
) -> Result<()> {
    match policy {
        TimePolicy::Dev => println!("Development mode: maximum acceleration for fast testing"),
        TimePolicy::Fast => println!("Fast mode: 100x speed with reasonable delays"),
        TimePolicy::Exact => println!("Exact mode: preserving original timing"),
        TimePolicy::Burst => println!("Burst mode: processing events as fast as possible"),
        TimePolicy::Custom { speed, max_delay } => {
            println!("Custom mode: {speed}x speed");
            if let Some(cap) = max_delay {
                println!("Maximum delay capped at: {cap}s");
            }
        }
    }

    let replayer = Replayer::new(&recording, &target)?;
    let meta = &replayer.recording().metadata;
    println!("Loaded recording with {} events", replayer.recording().events.len());
    println!("Recorded from: {}", meta.watch_dir);
    println!("Recorded at: {}", meta.recorded_at);
    println!("Replaying to {}", target.display());

    let summary = replayer.replay(&ReplayOptions {
        policy,
        verify,
        skip_unreadable,
    })?;

    println!("\nReplay completed in {:.1}s!", summary.elapsed.as_secs_f64());
    if summary.recorded_span > 0.0 && summary.elapsed.as_secs_f64() > 0.0 {
        println!(
            "Time compression: {:.1}x (original: {:.1}s)",
            summary.recorded_span / summary.elapsed.as_secs_f64(),
            summary.recorded_span
        );
    }
    if summary.skipped_unreadable > 0 {
        println!(
            "Skipped {} unreadable files during replay.",
            summary.skipped_unreadable
        );
    }

    if summary.verification_errors.is_empty() {
        if verify {
            println!("\nIntegrity verification passed!");
        }
    } else {
        println!(
            "\nIntegrity verification found {} issues:",
            summary.verification_errors.len()
        );
        for error in summary.verification_errors.iter().take(5) {
            println!("  - {error}");
        }
        if summary.verification_errors.len() > 5 {
            println!("  ... and {} more", summary.verification_errors.len() - 5);
        }
    }
    Ok(())
}

pub fn handle_info(recording: PathBuf) -> Result<()> {
    let info = info(&recording)?;
    println!("Recording information:");
    println!("  File: {}", recording.display());
    println!("  Recorded from: {}", info.metadata.watch_dir);
    println!("  Recorded at: {}", info.metadata.recorded_at);
    println!("  Total events: {}", info.metadata.total_events);
    println!("  Format version: {}", info.metadata.version);
    println!("  Source platform: {}", info.metadata.platform);
    if info.chunk_count > 0 {
        println!("  Binary chunks: {}", info.chunk_count);
    }
    println!("  Event breakdown:");
    for (event_type, count) in &info.event_counts {
        println!("    {event_type}: {count}");
    }
    Ok(())
}

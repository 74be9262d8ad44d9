use crate::archive::unpack::{self, Recording};
use crate::error::Result;
use crate::event::{Event, Payload};
use crate::hash;
use crate::replay::timing::TimePolicy;
use crate::util::paths;
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub policy: TimePolicy,
    pub verify: bool,
    pub skip_unreadable: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            policy: TimePolicy::default(),
            verify: true,
            skip_unreadable: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub total_events: usize,
    pub skipped_unreadable: usize,
    pub verification_errors: Vec<String>,
    pub elapsed: Duration,
    /// Recorded wall-clock span of the log, for the time-compression
    /// figure.
    pub recorded_span: f64,
}

/// Applies a loaded recording to a target directory in log order, pacing
/// events by the time policy. Per-event failures are logged and skipped;
/// only structural problems abort.
pub struct Replayer {
    recording: Recording,
    target: PathBuf,
}

impl Replayer {
    pub fn new(archive: &Path, target: &Path) -> Result<Self> {
        let recording = unpack::load(archive)?;
        log::info!(
            "loaded recording with {} events from {}",
            recording.events.len(),
            recording.metadata.watch_dir
        );
        Ok(Self {
            recording,
            target: target.to_path_buf(),
        })
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    pub fn replay(&self, opts: &ReplayOptions) -> Result<ReplaySummary> {
        fs::create_dir_all(&self.target)?;

        let events = &self.recording.events;
        let mut summary = ReplaySummary {
            total_events: events.len(),
            ..ReplaySummary::default()
        };
        if events.len() > 1 {
            summary.recorded_span =
                events[events.len() - 1].timestamp() - events[0].timestamp();
        }

        let started = Instant::now();
        let mut prev_ts = None;

        for (i, ev) in events.iter().enumerate() {
            if let Some(prev) = prev_ts {
                if let Some(delay) = opts.policy.delay_for(ev.timestamp() - prev) {
                    std::thread::sleep(delay);
                }
            }
            prev_ts = Some(ev.timestamp());

            if opts.skip_unreadable && is_unreadable_event(ev) {
                log::info!("skipped unreadable file: {}", ev.src_path());
                summary.skipped_unreadable += 1;
                continue;
            }

            if let Err(e) = self.apply(ev) {
                log::warn!(
                    "error replaying {} for {}: {e}",
                    ev.event_type(),
                    ev.src_path()
                );
            }

            if opts.verify && !ev.is_directory() {
                if let Some(expected) = ev.content_hash() {
                    if !expected.is_empty() && !hash::is_unreadable(expected) {
                        if let Some(err) = self.verify_event(ev, expected) {
                            summary.verification_errors.push(err);
                        }
                    }
                }
            }

            if i % 50 == 0 {
                log::debug!("progress: {}/{} events", i + 1, events.len());
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    fn apply(&self, ev: &Event) -> Result<()> {
        let target = paths::join_under(&self.target, ev.src_path())?;
        match ev {
            Event::InitialDir { .. } => {
                fs::create_dir_all(&target)?;
            }
            Event::Created {
                is_directory: true, ..
            } => {
                fs::create_dir_all(&target)?;
            }
            Event::Modified {
                is_directory: true, ..
            } => {}
            Event::InitialFile {
                size,
                payload,
                mtime,
                atime,
                ..
            } => {
                ensure_parent(&target)?;
                materialize(&target, payload, Some(*size), self.recording.chunks_dir())?;
                if let Some(mtime) = mtime {
                    restore_times(&target, *mtime, atime.unwrap_or(*mtime));
                }
            }
            Event::Created { size, payload, .. } => {
                ensure_parent(&target)?;
                materialize(&target, payload, *size, self.recording.chunks_dir())?;
            }
            Event::Modified { size, payload, .. } => {
                if !target.exists() {
                    log::warn!("cannot modify non-existent file {}", ev.src_path());
                    return Ok(());
                }
                materialize(&target, payload, *size, self.recording.chunks_dir())?;
            }
            Event::Appended {
                payload, offset, ..
            } => {
                if !target.exists() {
                    log::warn!("cannot append to non-existent file {}", ev.src_path());
                    return Ok(());
                }
                let current = fs::metadata(&target)?.len();
                if current != *offset {
                    log::warn!(
                        "file size mismatch for {}: expected {offset}, got {current}; appending anyway",
                        ev.src_path()
                    );
                }
                let mut f = OpenOptions::new().append(true).open(&target)?;
                match payload {
                    Payload::Text(text) => f.write_all(text.as_bytes())?,
                    Payload::Chunk(id) => {
                        f.write_all(&unpack::load_chunk(self.recording.chunks_dir(), id)?)?
                    }
                    _ => {}
                }
            }
            Event::Truncated { new_size, .. } => {
                if !target.exists() {
                    log::warn!("cannot truncate non-existent file {}", ev.src_path());
                    return Ok(());
                }
                OpenOptions::new()
                    .write(true)
                    .open(&target)?
                    .set_len(*new_size)?;
            }
            Event::Deleted { is_directory, .. } => {
                if target.exists() {
                    if *is_directory {
                        fs::remove_dir_all(&target)?;
                    } else {
                        fs::remove_file(&target)?;
                    }
                }
            }
            Event::Moved { dest, .. } => {
                if target.exists() {
                    let dest = paths::join_under(&self.target, dest)?;
                    ensure_parent(&dest)?;
                    fs::rename(&target, &dest)?;
                }
            }
        }
        Ok(())
    }

    fn verify_event(&self, ev: &Event, expected: &str) -> Option<String> {
        let target = match paths::join_under(&self.target, ev.src_path()) {
            Ok(p) => p,
            Err(e) => return Some(format!("error verifying {}: {e}", ev.src_path())),
        };
        if !target.exists() {
            return Some(format!("file missing after replay: {}", ev.src_path()));
        }
        match hash::hash_file(&target) {
            Ok(actual) if actual == expected => None,
            Ok(actual) => Some(format!(
                "hash mismatch for {}: expected {}..., got {}...",
                ev.src_path(),
                prefix(expected),
                prefix(&actual)
            )),
            Err(e) => Some(format!("error verifying {}: {e}", ev.src_path())),
        }
    }
}

fn is_unreadable_event(ev: &Event) -> bool {
    ev.content_hash().is_some_and(hash::is_unreadable)
}

fn prefix(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Write file content for a creation or modification: placeholders and
/// payload-free events become `size` zero bytes, text is written verbatim,
/// chunk ids pull bytes from the extracted chunk directory.
fn materialize(
    path: &Path,
    payload: &Payload,
    size: Option<u64>,
    chunks_dir: Option<&Path>,
) -> Result<()> {
    match payload {
        Payload::Text(text) => fs::write(path, text)?,
        Payload::Chunk(id) => fs::write(path, unpack::load_chunk(chunks_dir, id)?)?,
        Payload::Placeholder | Payload::None => {
            let f = File::create(path)?;
            f.set_len(size.unwrap_or(0))?;
        }
    }
    Ok(())
}

fn restore_times(path: &Path, mtime: f64, atime: f64) {
    // Reject stamps SystemTime arithmetic cannot represent.
    const MAX_STAMP: f64 = 1e12;
    if !(0.0..MAX_STAMP).contains(&mtime) || !(0.0..MAX_STAMP).contains(&atime) {
        return;
    }
    let times = FileTimes::new()
        .set_modified(UNIX_EPOCH + Duration::from_secs_f64(mtime))
        .set_accessed(UNIX_EPOCH + Duration::from_secs_f64(atime));
    let result = File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_times(times));
    if let Err(e) = result {
        log::warn!("could not set timestamps for {}: {e}", path.display());
    }
}

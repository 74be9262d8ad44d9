use crate::archive::manifest::{Manifest, Metadata};
use crate::archive::pack;
use crate::classify::ContentPolicy;
use crate::error::{FsrecError, Result};
use crate::event::Event;
use crate::record::detector::{ChangeDetector, Notification};
use crate::record::{notify_map, snapshot};
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecorderOptions {
    pub skip_binary_content: bool,
    pub force_text_extensions: Vec<String>,
    pub force_binary_extensions: Vec<String>,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            skip_binary_content: true,
            force_text_extensions: Vec::new(),
            force_binary_extensions: Vec::new(),
        }
    }
}

/// One recording session: seeds the log with the initial snapshot, then
/// consumes watcher notifications until stopped, and finally seals the
/// log plus captured chunks into the output archive.
///
/// All mutable state (tracker, chunk store, event log) is touched only by
/// the thread driving [`Recorder::run_until`]; the notifier thread just
/// feeds the channel.
pub struct Recorder {
    watch_dir: PathBuf,
    output: PathBuf,
    detector: ChangeDetector,
    events: Vec<Event>,
}

impl Recorder {
    pub fn new(watch_dir: &Path, output: &Path, options: RecorderOptions) -> Result<Self> {
        let watch_dir = watch_dir.canonicalize()?;
        let policy = ContentPolicy::new(
            options.skip_binary_content,
            &options.force_text_extensions,
            &options.force_binary_extensions,
        );
        let mut detector = ChangeDetector::new(watch_dir.clone(), policy)?;
        let events = snapshot::capture_initial_state(&mut detector)?;
        log::info!(
            "captured initial state of {}: {} events",
            watch_dir.display(),
            events.len()
        );
        Ok(Self {
            watch_dir,
            output: output.to_path_buf(),
            detector,
            events,
        })
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Feed one notification through the detector and append the resulting
    /// event, if any. Exposed for driving a session without a live watcher.
    pub fn apply(&mut self, n: &Notification) -> Result<()> {
        if let Some(ev) = self.detector.handle(n)? {
            log::info!("{}: {}", ev.event_type(), ev.src_path());
            self.events.push(ev);
        }
        Ok(())
    }

    /// Watch the root recursively and record until `stop` is raised. The
    /// notifier runs on its own thread and is joined (via watcher drop)
    /// before this returns, so a following [`Recorder::seal`] sees the
    /// complete log.
    pub fn run_until(&mut self, stop: &AtomicBool) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&self.watch_dir, RecursiveMode::Recursive)?;

        while !stop.load(Ordering::SeqCst) {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(Ok(event)) => {
                    for n in notify_map::map_event(&event) {
                        self.apply(&n)?;
                    }
                }
                Ok(Err(e)) => log::warn!("watch error: {e}"),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(FsrecError::Format(
                        "filesystem notifier stopped unexpectedly".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Seal the captured log and chunks into the output archive.
    pub fn seal(&self) -> Result<()> {
        let metadata = Metadata::for_recording(&self.watch_dir, self.events.len() as u64)?;
        let manifest = Manifest {
            metadata,
            events: self.events.iter().map(Event::to_raw).collect(),
        };
        pack::pack(&manifest, &self.detector.chunk_files(), &self.output)
    }

    pub fn unreadable_report(&self) -> Vec<String> {
        self.detector.unreadable_report()
    }

    pub fn placeholder_report(&self) -> Vec<String> {
        self.detector.placeholder_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::unpack;

    #[test]
    fn snapshot_then_seal_produces_a_loadable_archive() {
        let watched = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(watched.path().join("sub")).unwrap();
        std::fs::write(watched.path().join("sub/a.txt"), "hello").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("rec.tar.gz");
        let mut rec =
            Recorder::new(watched.path(), &out, RecorderOptions::default()).unwrap();

        // Mutate and feed the matching notifications by hand.
        std::fs::write(watched.path().join("sub/a.txt"), "hello world").unwrap();
        rec.apply(&Notification::Modified {
            path: watched.path().join("sub/a.txt").canonicalize().unwrap(),
            is_dir: false,
        })
        .unwrap();

        rec.seal().unwrap();

        let loaded = unpack::load(&out).unwrap();
        assert_eq!(loaded.metadata.total_events, rec.events().len() as u64);
        assert_eq!(loaded.metadata.version, "2.0");
        let types: Vec<_> = loaded.events.iter().map(|e| e.event_type()).collect();
        assert!(types.contains(&"initial_dir"));
        assert!(types.contains(&"initial_file"));
        assert!(types.contains(&"appended"));
    }

    #[test]
    fn stop_flag_ends_the_watch_loop() {
        let watched = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("rec.tar.gz");
        let mut rec =
            Recorder::new(watched.path(), &out, RecorderOptions::default()).unwrap();

        let stop = AtomicBool::new(true);
        // Already raised: the loop must return promptly without events.
        rec.run_until(&stop).unwrap();
        rec.seal().unwrap();
        assert!(out.exists());
    }
}

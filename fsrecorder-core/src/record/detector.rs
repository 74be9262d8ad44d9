use crate::chunk::store::ChunkStore;
use crate::classify::ContentPolicy;
use crate::error::{FsrecError, Result};
use crate::event::{Event, Payload};
use crate::hash;
use crate::state::{FileState, StateTracker};
use crate::util::paths;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Text content at or above this size goes to the chunk store instead of
/// inline into the manifest.
pub const INLINE_LIMIT: u64 = 1024 * 1024;

/// A normalized filesystem notification, as delivered by the watcher
/// thread. `is_dir` is the notifier's best knowledge of the target kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Created { path: PathBuf, is_dir: bool },
    Modified { path: PathBuf, is_dir: bool },
    Deleted { path: PathBuf, is_dir: bool },
    Moved { src: PathBuf, dest: PathBuf, is_dir: bool },
}

/// Classifies raw notifications into minimal log events by comparing the
/// on-disk state against the [`StateTracker`]. Owns the chunk store and
/// the unreadable/placeholder reports for the recording run.
pub struct ChangeDetector {
    root: PathBuf,
    policy: ContentPolicy,
    states: StateTracker,
    chunks: ChunkStore,
    unreadable: Vec<String>,
    placeholders: Vec<String>,
    last_ts: f64,
}

impl ChangeDetector {
    pub fn new(root: PathBuf, policy: ContentPolicy) -> Result<Self> {
        Ok(Self {
            root,
            policy,
            states: StateTracker::new(),
            chunks: ChunkStore::new()?,
            unreadable: Vec::new(),
            placeholders: Vec::new(),
            last_ts: 0.0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tracked(&self) -> usize {
        self.states.len()
    }

    /// Chunk files captured so far, in id order.
    pub fn chunk_files(&self) -> Vec<(String, PathBuf)> {
        self.chunks.files()
    }

    /// Paths whose bytes could not be read, deduplicated and sorted.
    pub fn unreadable_report(&self) -> Vec<String> {
        dedup_sorted(&self.unreadable)
    }

    /// Paths captured as size-only placeholders, deduplicated and sorted.
    pub fn placeholder_report(&self) -> Vec<String> {
        dedup_sorted(&self.placeholders)
    }

    /// Handle one notification, producing zero or one event. A deletion or
    /// move of the watched root itself is unrecoverable and aborts.
    pub fn handle(&mut self, n: &Notification) -> Result<Option<Event>> {
        match n {
            Notification::Deleted { path, is_dir } => {
                let Some(norm) = self.normalize(path) else {
                    return Ok(None);
                };
                if norm.is_empty() {
                    return Err(root_disappeared());
                }
                let timestamp = self.now();
                if !is_dir {
                    self.states.remove(&norm);
                }
                Ok(Some(Event::Deleted {
                    timestamp,
                    path: norm,
                    is_directory: *is_dir,
                }))
            }
            Notification::Moved { src, dest, is_dir } => {
                let Some(src_norm) = self.normalize(src) else {
                    return Ok(None);
                };
                if src_norm.is_empty() {
                    return Err(root_disappeared());
                }
                let Some(dest_norm) = self.normalize(dest) else {
                    return Ok(None);
                };
                self.states.rename(&src_norm, &dest_norm);
                Ok(Some(Event::Moved {
                    timestamp: self.now(),
                    path: src_norm,
                    dest: dest_norm,
                    is_directory: *is_dir,
                }))
            }
            Notification::Created { path, is_dir } | Notification::Modified { path, is_dir } => {
                let created = matches!(n, Notification::Created { .. });
                let Some(norm) = self.normalize(path) else {
                    return Ok(None);
                };
                if norm.is_empty() {
                    return Ok(None);
                }
                if *is_dir {
                    return Ok(Some(self.directory_event(norm, created)));
                }
                Ok(self.handle_file_change(path, norm))
            }
        }
    }

    fn directory_event(&mut self, norm: String, created: bool) -> Event {
        let timestamp = self.now();
        if created {
            Event::Created {
                timestamp,
                path: norm,
                is_directory: true,
                size: None,
                hash: None,
                payload: Payload::None,
            }
        } else {
            Event::Modified {
                timestamp,
                path: norm,
                is_directory: true,
                size: None,
                hash: None,
                payload: Payload::None,
            }
        }
    }

    /// Delta classification for a live file: creation for untracked paths,
    /// nothing when the hash is unchanged, append/truncate from the size
    /// delta, full modification otherwise.
    fn handle_file_change(&mut self, path: &Path, norm: String) -> Option<Event> {
        // The target may already be gone by the time we get here.
        let size = match std::fs::metadata(path) {
            Ok(md) if md.is_file() => md.len(),
            _ => return None,
        };
        let hash = self.hash_reported(path);

        let Some(old) = self.states.get(&norm).cloned() else {
            return Some(self.record_creation(path, norm, size, hash));
        };
        if hash == old.hash {
            return None;
        }
        if size > old.size {
            Some(self.record_append(path, norm, old.size, size, hash))
        } else if size < old.size {
            Some(self.record_truncate(norm, size, hash))
        } else {
            Some(self.record_modification(path, norm, size, hash))
        }
    }

    fn record_creation(&mut self, path: &Path, norm: String, size: u64, hash: String) -> Event {
        let timestamp = self.now();
        let payload = self.capture_full(path, size);
        self.states.insert(
            norm.clone(),
            FileState {
                size,
                hash: hash.clone(),
                text: payload.text().map(str::to_string),
            },
        );
        Event::Created {
            timestamp,
            path: norm,
            is_directory: false,
            size: Some(size),
            hash: Some(hash),
            payload,
        }
    }

    fn record_append(
        &mut self,
        path: &Path,
        norm: String,
        old_size: u64,
        new_size: u64,
        hash: String,
    ) -> Event {
        let append_size = new_size - old_size;
        let tail = match read_range(path, old_size, append_size) {
            Ok(bytes) => bytes,
            Err(e) => {
                // Cannot read just the suffix; capture the whole file.
                log::warn!(
                    "cannot read appended content for {}: {e}; recording full modification",
                    path.display()
                );
                return self.record_modification(path, norm, new_size, hash);
            }
        };

        let payload = match String::from_utf8(tail) {
            Ok(text) => Payload::Text(text),
            Err(e) => match self.chunks.store(e.as_bytes()) {
                Ok(id) => Payload::Chunk(id),
                Err(err) => {
                    log::warn!("cannot store chunk for {}: {err}", path.display());
                    self.unreadable.push(path.display().to_string());
                    Payload::None
                }
            },
        };

        if let Some(st) = self.states.get_mut(&norm) {
            st.size = new_size;
            st.hash = hash.clone();
        }
        Event::Appended {
            timestamp: self.now(),
            path: norm,
            size: new_size,
            hash,
            payload,
            offset: old_size,
            append_size,
        }
    }

    fn record_truncate(&mut self, norm: String, new_size: u64, hash: String) -> Event {
        if let Some(st) = self.states.get_mut(&norm) {
            st.size = new_size;
            st.hash = hash.clone();
        }
        Event::Truncated {
            timestamp: self.now(),
            path: norm,
            size: new_size,
            hash,
            new_size,
        }
    }

    fn record_modification(&mut self, path: &Path, norm: String, size: u64, hash: String) -> Event {
        let timestamp = self.now();
        let payload = self.capture_full(path, size);
        if let Some(st) = self.states.get_mut(&norm) {
            st.size = size;
            st.hash = hash.clone();
            st.text = payload.text().map(str::to_string);
        } else {
            self.states.insert(
                norm.clone(),
                FileState {
                    size,
                    hash: hash.clone(),
                    text: payload.text().map(str::to_string),
                },
            );
        }
        Event::Modified {
            timestamp,
            path: norm,
            is_directory: false,
            size: Some(size),
            hash: Some(hash),
            payload,
        }
    }

    /// Capture full file content under the configured policy: placeholder
    /// for skipped binaries, inline text for small text files, chunk store
    /// for everything else. Unreadable files yield no payload.
    pub(crate) fn capture_full(&mut self, path: &Path, size: u64) -> Payload {
        if self.policy.use_placeholder(path) {
            self.placeholders.push(path.display().to_string());
            return Payload::Placeholder;
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("cannot read file content for {}: {e}", path.display());
                self.unreadable.push(path.display().to_string());
                return Payload::None;
            }
        };
        if size < INLINE_LIMIT && !self.policy.is_binary(path) {
            return Payload::Text(String::from_utf8_lossy(&bytes).into_owned());
        }
        match self.chunks.store(&bytes) {
            Ok(id) => Payload::Chunk(id),
            Err(e) => {
                log::warn!("cannot store chunk for {}: {e}", path.display());
                self.unreadable.push(path.display().to_string());
                Payload::None
            }
        }
    }

    pub(crate) fn hash_reported(&mut self, path: &Path) -> String {
        match hash::hash_file(path) {
            Ok(h) => h,
            Err(e) => {
                log::warn!("cannot read file {}: {e}", path.display());
                self.unreadable.push(path.display().to_string());
                hash::unreadable_sentinel(path)
            }
        }
    }

    pub(crate) fn insert_state(&mut self, norm: String, state: FileState) {
        self.states.insert(norm, state);
    }

    pub(crate) fn normalize(&self, path: &Path) -> Option<String> {
        match paths::normalize_rel(&self.root, path) {
            Ok(s) => Some(s),
            Err(e) => {
                log::debug!("dropping notification outside watch root: {e}");
                None
            }
        }
    }

    /// Wall-clock timestamp, clamped so the log never goes backwards.
    pub(crate) fn now(&mut self) -> f64 {
        let t = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(self.last_ts);
        if t < self.last_ts {
            self.last_ts
        } else {
            self.last_ts = t;
            t
        }
    }
}

fn root_disappeared() -> FsrecError {
    FsrecError::Format("watched root disappeared during recording".to_string())
}

fn read_range(path: &Path, offset: u64, len: u64) -> std::io::Result<Vec<u8>> {
    let mut f = File::open(path)?;
    f.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len as usize);
    f.take(len).read_to_end(&mut buf)?;
    Ok(buf)
}

fn dedup_sorted(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = items.to_vec();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    fn detector(root: &Path) -> ChangeDetector {
        ChangeDetector::new(root.to_path_buf(), ContentPolicy::default()).unwrap()
    }

    fn created(path: PathBuf) -> Notification {
        Notification::Created {
            path,
            is_dir: false,
        }
    }

    fn modified(path: PathBuf) -> Notification {
        Notification::Modified {
            path,
            is_dir: false,
        }
    }

    #[test]
    fn untracked_file_is_a_creation() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("new.txt");
        std::fs::write(&p, "hello").unwrap();

        let ev = det.handle(&modified(p)).unwrap().unwrap();
        match ev {
            Event::Created {
                path,
                size,
                hash,
                payload,
                ..
            } => {
                assert_eq!(path, "new.txt");
                assert_eq!(size, Some(5));
                assert_eq!(hash.as_deref(), Some(hash_bytes(b"hello").as_str()));
                assert_eq!(payload.text(), Some("hello"));
            }
            other => panic!("expected created, got {other:?}"),
        }
        assert_eq!(det.tracked(), 1);
    }

    #[test]
    fn unchanged_content_is_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("same.txt");
        std::fs::write(&p, "stable").unwrap();

        assert!(det.handle(&created(p.clone())).unwrap().is_some());
        assert!(det.handle(&modified(p)).unwrap().is_none());
    }

    #[test]
    fn growth_is_an_append_with_tail_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("a.log");
        std::fs::write(&p, "hello").unwrap();
        det.handle(&created(p.clone())).unwrap();

        std::fs::write(&p, "hello world!").unwrap();
        let ev = det.handle(&modified(p)).unwrap().unwrap();
        match ev {
            Event::Appended {
                payload,
                offset,
                append_size,
                size,
                ..
            } => {
                assert_eq!(offset, 5);
                assert_eq!(append_size, 7);
                assert_eq!(size, 12);
                assert_eq!(payload.text(), Some(" world!"));
            }
            other => panic!("expected appended, got {other:?}"),
        }
    }

    #[test]
    fn binary_tail_goes_to_chunk_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("mixed.unknownext");
        std::fs::write(&p, "text").unwrap();
        det.handle(&created(p.clone())).unwrap();

        let mut grown = b"text".to_vec();
        grown.extend_from_slice(&[0xff, 0xfe, 0x00]);
        std::fs::write(&p, &grown).unwrap();
        let ev = det.handle(&modified(p)).unwrap().unwrap();
        match ev {
            Event::Appended { payload, .. } => {
                let id = payload.chunk_id().expect("chunk payload").to_string();
                assert_eq!(det.chunks.load(&id).unwrap(), vec![0xff, 0xfe, 0x00]);
            }
            other => panic!("expected appended, got {other:?}"),
        }
    }

    #[test]
    fn shrink_is_a_truncate_without_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("d.txt");
        std::fs::write(&p, "0123456789").unwrap();
        det.handle(&created(p.clone())).unwrap();

        std::fs::write(&p, "0123").unwrap();
        let ev = det.handle(&modified(p)).unwrap().unwrap();
        match ev {
            Event::Truncated { new_size, size, .. } => {
                assert_eq!(new_size, 4);
                assert_eq!(size, 4);
            }
            other => panic!("expected truncated, got {other:?}"),
        }
    }

    #[test]
    fn same_size_rewrite_is_a_full_modification() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("m.txt");
        std::fs::write(&p, "aaaa").unwrap();
        det.handle(&created(p.clone())).unwrap();

        std::fs::write(&p, "bbbb").unwrap();
        let ev = det.handle(&modified(p)).unwrap().unwrap();
        match ev {
            Event::Modified { payload, size, .. } => {
                assert_eq!(size, Some(4));
                assert_eq!(payload.text(), Some("bbbb"));
            }
            other => panic!("expected modified, got {other:?}"),
        }
    }

    #[test]
    fn delete_drops_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("x.txt");
        std::fs::write(&p, "x").unwrap();
        det.handle(&created(p.clone())).unwrap();
        std::fs::remove_file(&p).unwrap();

        let ev = det
            .handle(&Notification::Deleted {
                path: p,
                is_dir: false,
            })
            .unwrap()
            .unwrap();
        assert_eq!(ev.event_type(), "deleted");
        assert_eq!(det.tracked(), 0);
    }

    #[test]
    fn move_renames_state_and_keeps_hash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        let mut det = detector(dir.path());
        let src = dir.path().join("a/x.txt");
        std::fs::write(&src, "content").unwrap();
        det.handle(&created(src.clone())).unwrap();

        let dest = dir.path().join("b/x.txt");
        std::fs::rename(&src, &dest).unwrap();
        let ev = det
            .handle(&Notification::Moved {
                src,
                dest: dest.clone(),
                is_dir: false,
            })
            .unwrap()
            .unwrap();
        match ev {
            Event::Moved { path, dest, .. } => {
                assert_eq!(path, "a/x.txt");
                assert_eq!(dest, "b/x.txt");
            }
            other => panic!("expected moved, got {other:?}"),
        }
        // A follow-up touch with identical bytes stays quiet.
        assert!(det.handle(&modified(dest)).unwrap().is_none());
    }

    #[test]
    fn vanished_target_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("ghost.txt");
        assert!(det.handle(&modified(p)).unwrap().is_none());
    }

    #[test]
    fn root_deletion_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let err = det
            .handle(&Notification::Deleted {
                path: dir.path().to_path_buf(),
                is_dir: true,
            })
            .unwrap_err();
        assert!(err.to_string().contains("watched root"));
    }

    #[test]
    fn placeholder_capture_skips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        let p = dir.path().join("img.png");
        std::fs::write(&p, [9u8; 64]).unwrap();

        let ev = det.handle(&created(p)).unwrap().unwrap();
        match ev {
            Event::Created { payload, size, .. } => {
                assert!(payload.is_placeholder());
                assert_eq!(size, Some(64));
            }
            other => panic!("expected created, got {other:?}"),
        }
        assert!(det.chunk_files().is_empty());
        assert_eq!(det.placeholder_report().len(), 1);
    }

    #[test]
    fn binary_content_is_chunked_when_not_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let policy = ContentPolicy::new(false, &[], &[]);
        let mut det = ChangeDetector::new(dir.path().to_path_buf(), policy).unwrap();
        let p = dir.path().join("img.png");
        std::fs::write(&p, [9u8; 64]).unwrap();

        let ev = det.handle(&created(p)).unwrap().unwrap();
        match ev {
            Event::Created { payload, .. } => {
                assert_eq!(payload.chunk_id(), Some("chunk_0"));
            }
            other => panic!("expected created, got {other:?}"),
        }
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let mut det = detector(dir.path());
        det.last_ts = f64::MAX / 2.0;
        let t = det.now();
        assert!(t >= f64::MAX / 2.0);
    }
}

use crate::error::Result;
use crate::event::Event;
use crate::record::detector::ChangeDetector;
use crate::state::FileState;
use std::path::Path;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Walk the watched root and emit the seeding `initial_dir` /
/// `initial_file` events. Replay recreates directories parent-first, so
/// the traversal order is not significant.
pub fn capture_initial_state(det: &mut ChangeDetector) -> Result<Vec<Event>> {
    let root = det.root().to_path_buf();
    let mut events = Vec::new();

    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            if path == root {
                continue;
            }
            let Some(norm) = det.normalize(path) else {
                continue;
            };
            events.push(Event::InitialDir {
                timestamp: det.now(),
                path: norm,
            });
        } else if entry.file_type().is_file() {
            match initial_file(det, path) {
                Ok(ev) => events.push(ev),
                // Files can vanish between the walk and the stat.
                Err(e) => log::warn!("skipping {} in snapshot: {e}", path.display()),
            }
        }
        // Symlinks and special files are not captured.
    }
    Ok(events)
}

fn initial_file(det: &mut ChangeDetector, path: &Path) -> Result<Event> {
    let Some(norm) = det.normalize(path) else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} outside watch root", path.display()),
        )
        .into());
    };
    let md = std::fs::metadata(path)?;
    let size = md.len();
    let hash = det.hash_reported(path);
    let timestamp = det.now();
    let payload = det.capture_full(path, size);

    det.insert_state(
        norm.clone(),
        FileState {
            size,
            hash: hash.clone(),
            text: payload.text().map(str::to_string),
        },
    );

    Ok(Event::InitialFile {
        timestamp,
        path: norm,
        size,
        hash,
        payload,
        mtime: stat_secs(md.modified().ok()),
        atime: stat_secs(md.accessed().ok()),
    })
}

fn stat_secs(t: Option<std::time::SystemTime>) -> Option<f64> {
    t.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
}

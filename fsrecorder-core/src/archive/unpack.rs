use crate::archive::manifest::Manifest;
use crate::error::{FsrecError, Result};
use crate::event::Event;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A loaded recording: parsed events plus the extracted chunk directory,
/// whose backing temp dir lives as long as this value.
#[derive(Debug)]
pub struct Recording {
    pub metadata: crate::archive::manifest::Metadata,
    pub events: Vec<Event>,
    chunks_dir: Option<PathBuf>,
    _extracted: Option<TempDir>,
}

impl Recording {
    pub fn chunks_dir(&self) -> Option<&Path> {
        self.chunks_dir.as_deref()
    }

    pub fn chunk_count(&self) -> usize {
        let Some(dir) = &self.chunks_dir else {
            return 0;
        };
        std::fs::read_dir(dir)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|x| x == "bin"))
                    .count()
            })
            .unwrap_or(0)
    }
}

enum Container {
    GzTar,
    Tar,
    Json,
}

fn sniff(path: &Path) -> Result<Container> {
    if path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
    {
        return Ok(Container::GzTar);
    }

    let mut head = [0u8; 512];
    let n = File::open(path)?.read(&mut head)?;
    if n >= 2 && head[0] == 0x1f && head[1] == 0x8b {
        return Ok(Container::GzTar);
    }
    if n >= 262 && &head[257..262] == b"ustar" {
        return Ok(Container::Tar);
    }
    Ok(Container::Json)
}

/// Load an archive produced by the recorder, or a legacy v1 JSON-only
/// manifest. Tar archives are extracted into a scoped temp directory.
pub fn load(path: &Path) -> Result<Recording> {
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("recording file not found: {}", path.display()),
        )
        .into());
    }

    let manifest;
    let mut chunks_dir = None;
    let mut extracted = None;

    match sniff(path)? {
        Container::Json => {
            manifest = serde_json::from_reader::<_, Manifest>(File::open(path)?)?;
        }
        container => {
            let tmp = tempfile::Builder::new().prefix("fsreplayer_").tempdir()?;
            let file = File::open(path)?;
            match container {
                Container::GzTar => tar::Archive::new(GzDecoder::new(file)).unpack(tmp.path())?,
                _ => tar::Archive::new(file).unpack(tmp.path())?,
            }

            let manifest_path = tmp.path().join("recording.json");
            if !manifest_path.exists() {
                return Err(FsrecError::Format(
                    "invalid archive: missing recording.json".to_string(),
                ));
            }
            manifest = serde_json::from_reader::<_, Manifest>(File::open(manifest_path)?)?;

            let chunks = tmp.path().join("chunks");
            if chunks.is_dir() {
                chunks_dir = Some(chunks);
            }
            extracted = Some(tmp);
        }
    }

    let events = manifest
        .events
        .iter()
        .map(Event::from_raw)
        .collect::<Result<Vec<_>>>()?;

    Ok(Recording {
        metadata: manifest.metadata,
        events,
        chunks_dir,
        _extracted: extracted,
    })
}

/// Read one chunk payload out of an extracted chunk directory.
pub fn load_chunk(chunks_dir: Option<&Path>, chunk_id: &str) -> Result<Vec<u8>> {
    let dir = chunks_dir.ok_or_else(|| {
        FsrecError::Format(format!("chunk {chunk_id} referenced but archive has no chunks"))
    })?;
    if chunk_id.contains('/') || chunk_id.contains('\\') {
        return Err(FsrecError::Format(format!("invalid chunk id: {chunk_id}")));
    }
    let path = dir.join(format!("{chunk_id}.bin"));
    if !path.exists() {
        return Err(FsrecError::Format(format!("binary chunk not found: {chunk_id}")));
    }
    Ok(std::fs::read(path)?)
}

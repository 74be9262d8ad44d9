use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Append-only store for captured binary payloads, backed by a scoped temp
/// directory. Ids are monotonic (`chunk_0`, `chunk_1`, ...); a chunk is
/// never rewritten or dropped before the archive is sealed. The temp
/// directory is removed when the store goes out of scope.
pub struct ChunkStore {
    dir: TempDir,
    counter: u64,
}

impl ChunkStore {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("fsrecorder_").tempdir()?;
        Ok(Self { dir, counter: 0 })
    }

    /// Store one payload, returning its chunk id.
    pub fn store(&mut self, content: &[u8]) -> Result<String> {
        let chunk_id = format!("chunk_{}", self.counter);
        self.counter += 1;
        fs::write(self.dir.path().join(format!("{chunk_id}.bin")), content)?;
        Ok(chunk_id)
    }

    /// Read a stored chunk back verbatim.
    pub fn load(&self, chunk_id: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.dir.path().join(format!("{chunk_id}.bin")))?)
    }

    pub fn len(&self) -> u64 {
        self.counter
    }

    pub fn is_empty(&self) -> bool {
        self.counter == 0
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Chunk files in id order, for draining into the archive.
    pub fn files(&self) -> Vec<(String, PathBuf)> {
        (0..self.counter)
            .map(|i| {
                let id = format!("chunk_{i}");
                let path = self.dir.path().join(format!("{id}.bin"));
                (id, path)
            })
            .collect()
    }
}

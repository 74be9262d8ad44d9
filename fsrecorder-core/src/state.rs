use std::collections::HashMap;

/// Last recorded state of one live file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileState {
    pub size: u64,
    pub hash: String,
    /// Inline text as of the last capture, when the file was small enough
    /// and classified text.
    pub text: Option<String>,
}

/// In-memory map from normalized path to [`FileState`]. The tracker is
/// authoritative for delta classification; the filesystem is consulted
/// only to compute the next state.
#[derive(Debug, Default)]
pub struct StateTracker {
    entries: HashMap<String, FileState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&FileState> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FileState> {
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn insert(&mut self, path: String, state: FileState) {
        self.entries.insert(path, state);
    }

    pub fn remove(&mut self, path: &str) -> Option<FileState> {
        self.entries.remove(path)
    }

    /// Carry the entry across a move; a no-op when the source was never
    /// tracked.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(state) = self.entries.remove(from) {
            self.entries.insert(to.to_string(), state);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use crate::archive::manifest::Metadata;
use crate::archive::unpack;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Summary of an archive for the `info` command.
#[derive(Debug)]
pub struct RecordingInfo {
    pub metadata: Metadata,
    pub chunk_count: usize,
    pub event_counts: BTreeMap<String, usize>,
}

pub fn info(archive: &Path) -> Result<RecordingInfo> {
    let rec = unpack::load(archive)?;
    let mut event_counts = BTreeMap::new();
    for ev in &rec.events {
        *event_counts.entry(ev.event_type().to_string()).or_insert(0) += 1;
    }
    Ok(RecordingInfo {
        chunk_count: rec.chunk_count(),
        metadata: rec.metadata,
        event_counts,
    })
}

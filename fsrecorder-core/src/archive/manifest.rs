use crate::error::Result;
use crate::event::RawEvent;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Format version written by this recorder. Version `"1.0"` marks a legacy
/// inline-only manifest without a chunk directory.
pub const ARCHIVE_VERSION: &str = "2.0";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Metadata {
    pub recorded_at: String,
    pub watch_dir: String,
    pub total_events: u64,
    #[serde(default = "legacy_version")]
    pub version: String,
    #[serde(default = "unknown_platform")]
    pub platform: String,
}

fn legacy_version() -> String {
    "1.0".to_string()
}

fn unknown_platform() -> String {
    "unknown".to_string()
}

impl Metadata {
    pub fn for_recording(watch_dir: &Path, total_events: u64) -> Result<Self> {
        let recorded_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| crate::error::FsrecError::Format(e.to_string()))?;
        Ok(Self {
            recorded_at,
            watch_dir: watch_dir.display().to_string(),
            total_events,
            version: ARCHIVE_VERSION.to_string(),
            platform: std::env::consts::OS.to_string(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Manifest {
    pub metadata: Metadata,
    pub events: Vec<RawEvent>,
}

use crate::error::{FsrecError, Result};
use serde::{Deserialize, Serialize};

/// Content captured for a file event. At most one of inline text or a
/// chunk reference is ever present; placeholders and unreadable files
/// carry nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Text(String),
    Chunk(String),
    Placeholder,
}

impl Payload {
    pub fn text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn chunk_id(&self) -> Option<&str> {
        match self {
            Payload::Chunk(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Payload::Placeholder)
    }
}

/// One entry of the recorded log. Each variant carries only the fields
/// that apply to it; the flat archive shape lives in [`RawEvent`].
///
/// Timestamps are seconds since the Unix epoch and non-decreasing within
/// a log. Paths are POSIX-relative to the watched root.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    InitialDir {
        timestamp: f64,
        path: String,
    },
    InitialFile {
        timestamp: f64,
        path: String,
        size: u64,
        hash: String,
        payload: Payload,
        mtime: Option<f64>,
        atime: Option<f64>,
    },
    Created {
        timestamp: f64,
        path: String,
        is_directory: bool,
        size: Option<u64>,
        hash: Option<String>,
        payload: Payload,
    },
    Modified {
        timestamp: f64,
        path: String,
        is_directory: bool,
        size: Option<u64>,
        hash: Option<String>,
        payload: Payload,
    },
    Appended {
        timestamp: f64,
        path: String,
        size: u64,
        hash: String,
        /// Appended suffix: inline text or a chunk, never a placeholder.
        payload: Payload,
        /// Byte offset where the suffix starts (the old file size).
        offset: u64,
        append_size: u64,
    },
    Truncated {
        timestamp: f64,
        path: String,
        size: u64,
        hash: String,
        new_size: u64,
    },
    Deleted {
        timestamp: f64,
        path: String,
        is_directory: bool,
    },
    Moved {
        timestamp: f64,
        path: String,
        dest: String,
        is_directory: bool,
    },
}

impl Event {
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::InitialDir { timestamp, .. }
            | Event::InitialFile { timestamp, .. }
            | Event::Created { timestamp, .. }
            | Event::Modified { timestamp, .. }
            | Event::Appended { timestamp, .. }
            | Event::Truncated { timestamp, .. }
            | Event::Deleted { timestamp, .. }
            | Event::Moved { timestamp, .. } => *timestamp,
        }
    }

    pub fn src_path(&self) -> &str {
        match self {
            Event::InitialDir { path, .. }
            | Event::InitialFile { path, .. }
            | Event::Created { path, .. }
            | Event::Modified { path, .. }
            | Event::Appended { path, .. }
            | Event::Truncated { path, .. }
            | Event::Deleted { path, .. }
            | Event::Moved { path, .. } => path,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::InitialDir { .. } => "initial_dir",
            Event::InitialFile { .. } => "initial_file",
            Event::Created { .. } => "created",
            Event::Modified { .. } => "modified",
            Event::Appended { .. } => "appended",
            Event::Truncated { .. } => "truncated",
            Event::Deleted { .. } => "deleted",
            Event::Moved { .. } => "moved",
        }
    }

    pub fn is_directory(&self) -> bool {
        match self {
            Event::InitialDir { .. } => true,
            Event::Created { is_directory, .. }
            | Event::Modified { is_directory, .. }
            | Event::Deleted { is_directory, .. }
            | Event::Moved { is_directory, .. } => *is_directory,
            _ => false,
        }
    }

    pub fn content_hash(&self) -> Option<&str> {
        match self {
            Event::InitialFile { hash, .. }
            | Event::Appended { hash, .. }
            | Event::Truncated { hash, .. } => Some(hash),
            Event::Created { hash, .. } | Event::Modified { hash, .. } => hash.as_deref(),
            _ => None,
        }
    }

    pub fn to_raw(&self) -> RawEvent {
        let mut raw = RawEvent {
            timestamp: self.timestamp(),
            event_type: self.event_type().to_string(),
            src_path: self.src_path().to_string(),
            ..RawEvent::default()
        };
        match self {
            Event::InitialDir { .. } => {
                raw.is_directory = true;
            }
            Event::InitialFile {
                size,
                hash,
                payload,
                mtime,
                atime,
                ..
            } => {
                raw.size = Some(*size);
                raw.content_hash = Some(hash.clone());
                raw.set_payload(payload);
                raw.operation_data = Some(OperationData {
                    mtime: *mtime,
                    atime: *atime,
                    ..OperationData::default()
                });
            }
            Event::Created {
                is_directory,
                size,
                hash,
                payload,
                ..
            }
            | Event::Modified {
                is_directory,
                size,
                hash,
                payload,
                ..
            } => {
                raw.is_directory = *is_directory;
                raw.size = *size;
                raw.content_hash = hash.clone();
                raw.set_payload(payload);
            }
            Event::Appended {
                size,
                hash,
                payload,
                offset,
                append_size,
                ..
            } => {
                raw.size = Some(*size);
                raw.content_hash = Some(hash.clone());
                raw.set_payload(payload);
                raw.file_position = Some(*offset);
                raw.operation_data = Some(OperationData {
                    append_size: Some(*append_size),
                    ..OperationData::default()
                });
            }
            Event::Truncated {
                size,
                hash,
                new_size,
                ..
            } => {
                raw.size = Some(*size);
                raw.content_hash = Some(hash.clone());
                raw.operation_data = Some(OperationData {
                    new_size: Some(*new_size),
                    ..OperationData::default()
                });
            }
            Event::Deleted { is_directory, .. } => {
                raw.is_directory = *is_directory;
            }
            Event::Moved {
                dest, is_directory, ..
            } => {
                raw.dest_path = Some(dest.clone());
                raw.is_directory = *is_directory;
            }
        }
        raw
    }

    pub fn from_raw(raw: &RawEvent) -> Result<Event> {
        let payload = raw.payload()?;
        let op = raw.operation_data.clone().unwrap_or_default();
        let ev = match raw.event_type.as_str() {
            "initial_dir" => Event::InitialDir {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
            },
            "initial_file" => Event::InitialFile {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
                size: raw.size.unwrap_or(0),
                hash: raw.content_hash.clone().unwrap_or_default(),
                payload,
                mtime: op.mtime,
                atime: op.atime,
            },
            "created" => Event::Created {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
                is_directory: raw.is_directory,
                size: raw.size,
                hash: raw.content_hash.clone(),
                payload,
            },
            "modified" => Event::Modified {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
                is_directory: raw.is_directory,
                size: raw.size,
                hash: raw.content_hash.clone(),
                payload,
            },
            "appended" => Event::Appended {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
                size: raw.size.unwrap_or(0),
                hash: raw.content_hash.clone().unwrap_or_default(),
                payload,
                offset: raw.file_position.ok_or_else(|| {
                    FsrecError::Format(format!(
                        "appended event for {} missing file_position",
                        raw.src_path
                    ))
                })?,
                append_size: op.append_size.unwrap_or(0),
            },
            "truncated" => Event::Truncated {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
                size: raw.size.unwrap_or(0),
                hash: raw.content_hash.clone().unwrap_or_default(),
                new_size: op.new_size.or(raw.size).unwrap_or(0),
            },
            "deleted" => Event::Deleted {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
                is_directory: raw.is_directory,
            },
            "moved" => Event::Moved {
                timestamp: raw.timestamp,
                path: raw.src_path.clone(),
                dest: raw.dest_path.clone().ok_or_else(|| {
                    FsrecError::Format(format!(
                        "moved event for {} missing dest_path",
                        raw.src_path
                    ))
                })?,
                is_directory: raw.is_directory,
            },
            other => {
                return Err(FsrecError::Format(format!("unknown event type: {other}")));
            }
        };
        Ok(ev)
    }
}

/// Variant-specific extras carried by some events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_size: Option<u64>,
}

/// Flat wire shape of one event, as stored in `recording.json`. Unused
/// optional fields are omitted; readers accept them as `null` as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: f64,
    pub event_type: String,
    pub src_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_path: Option<String>,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_chunk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_data: Option<OperationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_position: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_placeholder: bool,
}

impl RawEvent {
    fn set_payload(&mut self, payload: &Payload) {
        match payload {
            Payload::None => {}
            Payload::Text(s) => self.content = Some(s.clone()),
            Payload::Chunk(id) => self.binary_chunk_id = Some(id.clone()),
            Payload::Placeholder => self.is_placeholder = true,
        }
    }

    fn payload(&self) -> Result<Payload> {
        match (&self.content, &self.binary_chunk_id) {
            (Some(_), Some(_)) => Err(FsrecError::Format(format!(
                "event for {} carries both content and binary_chunk_id",
                self.src_path
            ))),
            (Some(text), None) => Ok(Payload::Text(text.clone())),
            (None, Some(id)) => Ok(Payload::Chunk(id.clone())),
            (None, None) if self.is_placeholder => Ok(Payload::Placeholder),
            (None, None) => Ok(Payload::None),
        }
    }
}

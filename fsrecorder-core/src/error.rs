use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsrecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Format error: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, FsrecError>;

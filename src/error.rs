use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("invalid note payload: {0}")]
    InvalidPayload(&'static str),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("draft store is corrupt: {0}")]
    CorruptDrafts(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find home directory")]
    NoHome,
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to access lock file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

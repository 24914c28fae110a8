use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the hosted product table.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("no product with id {0}")]
    NotFound(String),
    #[error("unexpected response from backend: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not read image {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("image upload failed: {0}")]
    Rejected(String),
}

/// Snapshot read/write failure. Never leaves the cache module.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("snapshot io: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("bad snapshot location: {0}")]
    Location(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("invalid product: {0}")]
    Invalid(String),
}

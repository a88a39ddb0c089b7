//! Error types for the reading-aid core.

use thiserror::Error;

/// Durable storage failures. Fatal to the operation in progress; committed records stay intact.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("stored value could not be decoded: {0}")]
    Codec(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("word is empty after normalization")]
    EmptyKey,
}

/// The snapshot file is missing its expected shape or could not be read or written.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_yaml::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Fetching a dictionary page failed. Never cached.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid dictionary base url {0:?}")]
    InvalidBaseUrl(String),

    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("dictionary returned {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Failure of one word's definition lookup.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("word is empty after normalization")]
    EmptyWord,

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

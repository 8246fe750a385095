//! Error types shared by the parsers, the file cache and the report writer
//!
//! Per-record problems (`InvalidAddress`, `InvalidPrefix`) are values the
//! callers collect or log and then move past. `SinkUnavailable` aborts a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlocklensError {
    /// A single blocklist token is not an IPv4 or IPv6 literal
    #[error("invalid address '{token}': {reason}")]
    InvalidAddress { token: String, reason: String },

    /// A single metadata entry carries a CIDR that does not parse
    #[error("invalid prefix '{cidr}': {reason}")]
    InvalidPrefix { cidr: String, reason: String },

    /// The report destination cannot be opened or written
    #[error("report sink {path} unavailable: {source}")]
    SinkUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A remote or local dataset could not be read
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The IP ranges document is not what we expect
    #[error("malformed ranges document {path}: {reason}")]
    Document { path: String, reason: String },

    #[error("cache error at {path:?}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BlocklensError {
    /// Whether the error only concerns one record and the batch may continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BlocklensError::InvalidAddress { .. } | BlocklensError::InvalidPrefix { .. }
        )
    }
}

pub type BlocklensResult<T> = Result<T, BlocklensError>;

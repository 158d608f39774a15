use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Error type covering the failures that abort a model import.
///
/// Problems with individual records inside the registry response are not
/// represented here; those are logged and skipped by the response decoder.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Raised when the input path cannot be inspected at all.
    #[error("could not access the specified path {}: {source}", .path.display())]
    PathAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised when a file cannot be opened or fully read.
    #[error("could not read file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised when an archive path cannot be derived for a walked file.
    #[error("could not resolve archive path for {}: {reason}", .path.display())]
    PathResolution { path: PathBuf, reason: String },

    /// Wrapper for failures while writing the tar container or gzip stream.
    #[error("failed to build archive: {0}")]
    Archive(#[source] std::io::Error),

    /// Raised when the HTTP client cannot be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Raised when the request could not be delivered.
    #[error("failed to make {method} request to {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Raised when the registry answers with a non-success status code.
    #[error("{method} request to {url} failed with status {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Raised when the response payload cannot be read.
    #[error("failed to read {origin}: {source}")]
    DataRead {
        origin: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Raised when the response payload is not the expected JSON shape.
    #[error("failed to deserialize {origin}: {source}")]
    Deserialize {
        origin: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Raised when the request body cannot be encoded.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Raised when the report cannot be written to its destination.
    #[error("failed to write report: {0}")]
    Output(#[source] std::io::Error),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

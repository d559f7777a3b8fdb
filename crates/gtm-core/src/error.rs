use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single GTM API request.
///
/// Every variant is terminal for the request that produced it; callers
/// return to idle and wait for the next user action.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure (connection refused, DNS, TLS, ...)
    #[error("Cannot reach GTM API: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("GTM API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Response body was not the expected JSON shape
    #[error("Response parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local file could not be read for upload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload requested with no file selected
    #[error("No file selected")]
    NoFileSelected,

    /// Background request task panicked or was aborted
    #[error("Request task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

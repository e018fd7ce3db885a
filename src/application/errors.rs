// Error types shared across the application layer
use thiserror::Error;

/// Failure of a single Resource Client call. Never retried.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {path} timed out")]
    Timeout { path: String },

    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("backend rejected request: {0}")]
    Rejected(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("every data source failed for the {0} dashboard")]
    AllSourcesFailed(&'static str),

    #[error("engineer {0} not found")]
    EngineerNotFound(String),

    #[error("invalid period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error(transparent)]
    Upstream(#[from] ClientError),
}

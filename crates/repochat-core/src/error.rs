use reqwest::StatusCode;
use thiserror::Error;

/// A single request to the analyzer service failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: StatusCode },

    #[error("unexpected response from {endpoint}: {detail}")]
    Schema { endpoint: String, detail: String },

    #[error("invalid analyzer base URL {url}: {detail}")]
    InvalidBaseUrl { url: String, detail: String },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Failure of one of the analyzer protocol operations.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("failed to create analyzer job")]
    Creation(#[source] TransportError),

    #[error("failed to submit query")]
    QuerySubmission(#[source] TransportError),

    #[error("job did not finish after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("cancelled")]
    Cancelled,
}

/// Why a repository URL was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("repository URL is empty")]
    Empty,

    #[error("repository URL does not point at github.com")]
    MissingHost,

    #[error("repository URL has no owner/name path")]
    MissingRepository,
}

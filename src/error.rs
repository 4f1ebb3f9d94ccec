use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrafficError>;

#[derive(Error, Debug)]
pub enum TrafficError {
    /// Transient admission-control signal from the API. Recovered once
    /// per fetch when `retry_after` is present and positive, fatal
    /// otherwise.
    #[error("rate limited by the GitHub API")]
    RateLimited { retry_after: Option<Duration> },
    #[error("GitHub API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Internal invariant breach, e.g. views/clones report sets fed to
    /// the aggregator that do not cover the same repositories.
    #[error("internal contract violation: {0}")]
    Contract(String),
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl TrafficError {
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TrafficError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    /// Rate limited after the retry budget ran out. `reset_at` is a Unix timestamp.
    #[error("Rate limited. Resets at {reset_at}")]
    RateLimit { reset_at: i64 },
    #[error("Max retries exceeded after {0} attempts")]
    RetriesExhausted(u32),
    #[error("Empty response: {0}")]
    EmptyResponse(String),
    #[error("Invalid bearer token")]
    InvalidToken,
    #[error("Cannot encode/decode JSON: {0}")]
    JSONError(#[from] serde_json::Error),
    #[error("Cannot decode response: {0}")]
    ResponseError(#[from] serde_path_to_error::Error<serde_json::Error>),
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Network Error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Cannot parse URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// HTTP status of an API failure. Rate limiting reports 429.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Error::RateLimit { reset_at } => DateTime::from_timestamp(*reset_at, 0),
            _ => None,
        }
    }
}

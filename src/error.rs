// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failure of a single fetch against the directory API.
///
/// Everything except `NotFound` is transient: the next attempt may succeed.
/// `Clone` so one failure can be handed to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("API reported status {0:?}")]
    BadStatus(String),

    #[error("No metadata for mod {0}")]
    NotFound(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::HttpStatus(status.as_u16()),
            None if e.is_decode() => Self::Malformed(e.to_string()),
            None => Self::Network(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

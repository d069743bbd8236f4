use thiserror::Error;

use crate::models::application::ApplicationStatus;

/// Failures surfaced by the gateway and the controllers.
///
/// `Clone` so a coalesced detail fetch can hand the same error to every waiter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Connectivity or timeout. Only retried by an explicit user refresh.
    #[error("network error: {0}")]
    Network(String),

    /// The request was superseded by a newer one. Never shown to the user.
    #[error("request cancelled")]
    Cancelled,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("application cannot move from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
                StoreError::NotFound(e.to_string())
            }
            Some(status) => StoreError::Api {
                status: status.as_u16(),
                message: e.to_string(),
            },
            // Timeouts, refused connections and undecodable bodies all look the same to callers.
            None => StoreError::Network(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

//! Custom error types for the HR API client

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Custom error type for the HR API client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connection, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Request failed with status {status}")]
    Http { status: StatusCode, body: Value },

    /// The API answered `status: false`
    #[error("Server rejected request: {0}")]
    Rejected(String),

    /// Bad credentials or an unusable session
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The one-shot token refresh failed; the session tokens were cleared
    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[source] Box<ClientError>),

    /// Input rejected before any request was sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local persistence error
    #[error("Store error: {0}")]
    Store(#[from] common::StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// HTTP status behind this error, if the API produced one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Network(e) => e.status(),
            ClientError::RefreshFailed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Message provided by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Http { body, .. } => body
                .get("message")
                .or_else(|| body.get("detail"))
                .and_then(Value::as_str),
            ClientError::Rejected(message)
            | ClientError::Auth(message)
            | ClientError::Validation(message) => Some(message.as_str()),
            ClientError::RefreshFailed(inner) => inner.server_message(),
            _ => None,
        }
    }

    /// Machine-readable error code provided by the server, e.g. `token_not_valid`
    pub fn server_code(&self) -> Option<&str> {
        match self {
            ClientError::Http { body, .. } => body.get("code").and_then(Value::as_str),
            ClientError::RefreshFailed(inner) => inner.server_code(),
            _ => None,
        }
    }

    /// Text to show the user: the server message when there is one,
    /// `fallback` otherwise
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    /// Whether the user has to sign in again
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ClientError::Auth(_) | ClientError::RefreshFailed(_) => true,
            ClientError::Http { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }
}

/// Type alias for client results
pub type ClientResult<T> = Result<T, ClientError>;

/// Reverse geocoding failures; never fatal to a punch
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Geocoding service is throttling requests")]
    Throttled,

    #[error("Geocoding service responded with {0}")]
    Status(StatusCode),

    #[error("No address found for the given coordinates")]
    NoAddress,
}

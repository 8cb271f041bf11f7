//! Custom error types for the punch workflow

use client::ClientError;
use common::StoreError;
use std::fmt;
use thiserror::Error;

use crate::capabilities::{CaptureError, LocationError};

/// Device capability a permission belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Camera,
    Location,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Camera => f.write_str("Camera"),
            Capability::Location => f.write_str("Location"),
        }
    }
}

/// Custom error type for the punch workflow
#[derive(Error, Debug)]
pub enum PunchError {
    /// A required permission was not granted
    #[error("{0} permission is required")]
    PermissionDenied(Capability),

    /// Camera not ready or photo pipeline failure
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Location provider error or timeout
    #[error("Location failed: {0}")]
    Location(#[from] LocationError),

    /// No email is known for the submission
    #[error("No signed-in user")]
    NotSignedIn,

    /// HR API error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Local persistence error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Type alias for punch results
pub type PunchResult<T> = Result<T, PunchError>;

/// User-facing notice describing a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
}

impl Notice {
    fn new(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

impl PunchError {
    /// Notice to show for this error; `fallback` is used when the server
    /// gave no message of its own
    pub fn notice(&self, fallback: &str) -> Notice {
        match self {
            PunchError::PermissionDenied(capability) => Notice::new(
                "Permission Denied",
                format!("{capability} permission is required."),
            ),
            PunchError::Capture(CaptureError::NotReady) => {
                Notice::new("Camera Error", "Camera is not ready.")
            }
            PunchError::Capture(CaptureError::Failed(_)) => {
                Notice::new("Error", "Failed to capture or convert photo.")
            }
            PunchError::Location(_) => Notice::new("Error", "Failed to get location."),
            PunchError::NotSignedIn => Notice::new("Session Expired", "Please sign in again."),
            PunchError::Client(e) if e.is_auth_failure() => {
                Notice::new("Session Expired", "Please sign in again.")
            }
            PunchError::Client(e) => Notice::new("Error", e.user_message(fallback)),
            PunchError::Store(_) => Notice::new("Error", fallback),
        }
    }

    /// Whether the user has to sign in again
    pub fn requires_login(&self) -> bool {
        match self {
            PunchError::NotSignedIn => true,
            PunchError::Client(e) => e.is_auth_failure(),
            _ => false,
        }
    }
}

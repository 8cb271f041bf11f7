//! Device capabilities consumed by the punch workflow
//!
//! Camera and location providers are platform collaborators; the workflow
//! only depends on these contracts.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use client::models::Coordinates;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// Photo taken by the front camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Photo {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    /// `data:` URI carrying the base64-encoded photo, as the attendance
    /// endpoint expects it
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera is not ready")]
    NotReady,

    #[error("Failed to capture photo: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Location request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Location is unavailable")]
    Unavailable,
}

/// Options of a position request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Give up when no fix arrives within this delay
    pub timeout: Duration,
    /// Accept a cached fix at most this old
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(10),
        }
    }
}

/// Front camera
#[async_trait]
pub trait Camera: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    /// Whether the device is initialized and able to take a photo
    fn is_ready(&self) -> bool;

    async fn take_photo(&self) -> Result<Photo, CaptureError>;
}

/// Location provider
#[async_trait]
pub trait Locator: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, LocationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_data_uri() {
        let photo = Photo::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(photo.to_data_uri(), "data:image/jpeg;base64,/9j/4A==");
    }

    #[test]
    fn test_default_position_options() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(15));
        assert_eq!(options.maximum_age, Duration::from_secs(10));
    }
}

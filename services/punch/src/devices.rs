//! Devices backing the command-line driver
//!
//! A terminal has no camera, GPS or face sensor: the photo is read from a
//! file, the position comes from configuration and biometrics are absent.

use async_trait::async_trait;
use client::models::Coordinates;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::biometric::{BiometricError, Biometrics, Sensor};
use crate::capabilities::{
    Camera, CaptureError, LocationError, Locator, PermissionStatus, Photo, PositionOptions,
};

/// Camera "taking" the photo stored at a fixed path
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mime(&self) -> &'static str {
        match self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn is_ready(&self) -> bool {
        self.path.is_file()
    }

    async fn take_photo(&self) -> Result<Photo, CaptureError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CaptureError::Failed(format!("{}: {}", self.path.display(), e)))?;
        debug!("Read photo from {}", self.path.display());
        Ok(Photo::new(bytes, self.mime()))
    }
}

/// Locator reporting configured coordinates; permission is denied when
/// none are configured
pub struct FixedLocator {
    coordinates: Option<Coordinates>,
}

impl FixedLocator {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl Locator for FixedLocator {
    async fn request_permission(&self) -> PermissionStatus {
        if self.coordinates.is_some() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        self.coordinates.ok_or(LocationError::Unavailable)
    }
}

/// Biometrics of a device without any sensor
pub struct DeniedBiometrics;

#[async_trait]
impl Biometrics for DeniedBiometrics {
    async fn sensor(&self) -> Result<Sensor, BiometricError> {
        Ok(Sensor::unavailable())
    }

    async fn create_keys(&self) -> Result<Option<String>, BiometricError> {
        Err(BiometricError::Unsupported)
    }

    async fn prompt(&self, _message: &str) -> Result<bool, BiometricError> {
        Err(BiometricError::Unsupported)
    }
}

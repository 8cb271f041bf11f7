//! Device configuration of the command-line driver
//!
//! Shares the `punch.*` file and the `HRMS_*` environment with
//! [`client::ClientConfig`].

use client::config::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
use client::models::Coordinates;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the driver takes its photo and position from
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Image submitted as the punch photo
    pub photo_path: PathBuf,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl DeviceConfig {
    /// # Environment Variables
    /// - `HRMS_PHOTO_PATH`: punch photo (default: "selfie.jpg")
    /// - `HRMS_LATITUDE`, `HRMS_LONGITUDE`: reported position
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder().set_default("photo_path", "selfie.jpg")?;

        let builder = match file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Configured position; both coordinates are required
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }
}

//! Client configuration
//!
//! Values are layered with the `config` crate: built-in defaults, then an
//! optional `punch.toml` (or any format `config` understands), then `HRMS_*`
//! environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ClientResult;

/// Base name of the optional configuration file looked up in the working
/// directory
pub const DEFAULT_CONFIG_FILE: &str = "punch";

/// Prefix of the environment variables overriding the configuration
pub const ENV_PREFIX: &str = "HRMS";

/// Configuration of the HR API client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Versioned base URL of the HR API
    pub base_url: String,
    /// Path of the login endpoint, relative to `base_url`
    pub login_path: String,
    /// Path of the token refresh endpoint, relative to `base_url`
    pub refresh_path: String,
    /// Transport timeout applied to every request, in seconds
    pub request_timeout_secs: u64,
    /// Reverse geocoding endpoint
    pub geocode_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// File holding the persisted session and device flags
    pub store_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dev.intranet.intuitiveapps.com/hrms/api/v1/".to_string(),
            login_path: "login/".to_string(),
            refresh_path: "token/refresh/".to_string(),
            request_timeout_secs: 30,
            geocode_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: format!("hrms-punch/{}", env!("CARGO_PKG_VERSION")),
            store_path: PathBuf::from("hrms-state.json"),
        }
    }
}

impl ClientConfig {
    /// Load the configuration from `punch.*` in the working directory and
    /// the environment
    ///
    /// # Environment Variables
    /// - `HRMS_BASE_URL`: HR API base URL
    /// - `HRMS_LOGIN_PATH`: login endpoint (default: "login/")
    /// - `HRMS_REFRESH_PATH`: refresh endpoint (default: "token/refresh/")
    /// - `HRMS_REQUEST_TIMEOUT_SECS`: request timeout (default: 30)
    /// - `HRMS_GEOCODE_URL`: reverse geocoding endpoint
    /// - `HRMS_USER_AGENT`: user agent header
    /// - `HRMS_STORE_PATH`: local state file (default: "hrms-state.json")
    pub fn from_env() -> ClientResult<Self> {
        Self::load(None)
    }

    /// Load the configuration, reading `file` instead of the default
    /// `punch.*` lookup when given. An explicit file must exist.
    pub fn load(file: Option<&Path>) -> ClientResult<Self> {
        let defaults = Self::default();

        let builder = Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("login_path", defaults.login_path)?
            .set_default("refresh_path", defaults.refresh_path)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("geocode_url", defaults.geocode_url)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default(
                "store_path",
                defaults.store_path.to_string_lossy().into_owned(),
            )?;

        let builder = match file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

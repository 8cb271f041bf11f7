//! Reverse geocoding through a Nominatim-compatible endpoint

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientResult, GeocodeError};
use crate::models::Coordinates;

/// Resolves a coordinate pair to a human-readable address
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, coordinates: Coordinates) -> Result<String, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct Place {
    display_name: Option<String>,
}

/// Reverse geocoder backed by OpenStreetMap Nominatim
#[derive(Clone)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        // Nominatim's usage policy rejects requests without a user agent
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            url: config.geocode_url.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<String, GeocodeError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("zoom", "18".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Reverse geocoding throttled for {}", coordinates);
                return Err(GeocodeError::Throttled);
            }
            status if !status.is_success() => return Err(GeocodeError::Status(status)),
            _ => {}
        }

        let place: Place = response.json().await?;
        let address = place
            .display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(GeocodeError::NoAddress)?;

        info!("Resolved {} to {}", coordinates, address);
        Ok(address)
    }
}

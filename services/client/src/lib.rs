//! HTTP client for the HRMS attendance API
//!
//! The [`http::SessionClient`] attaches the persisted bearer token to every
//! request except login, and transparently performs a single token refresh
//! and replay when the API answers 401. [`api::HrApi`] exposes the typed
//! endpoints on top of it, and [`geocode`] resolves coordinates to a
//! readable address.

pub mod api;
pub mod config;
pub mod error;
pub mod geocode;
pub mod http;
pub mod models;
pub mod validation;

pub use api::{AttendanceApi, HrApi};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, GeocodeError};
pub use geocode::{NominatimGeocoder, ReverseGeocoder};
pub use http::{ApiResponse, FormPart, FormValue, RequestBody, SessionClient};

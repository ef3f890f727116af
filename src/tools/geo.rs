// src/tools/geo.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

const GEO_API: &str = "https://ipapi.co/json/";

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected response status: {0}")]
    BadStatus(reqwest::StatusCode),
}

/// Approximate caller location, display only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeoLocation {
    pub ip: Option<String>,
    pub city: Option<String>,
    pub country_name: Option<String>,
}

/// Single-shot lookup against ipapi.co. No retries, no caching; the
/// caller degrades to an unknown state on failure.
pub async fn lookup() -> Result<GeoLocation, GeoError> {
    let client = reqwest::Client::new();
    let response = client.get(GEO_API).send().await?;

    if !response.status().is_success() {
        return Err(GeoError::BadStatus(response.status()));
    }

    let location: GeoLocation = response.json().await?;
    Ok(location)
}

//! # Nominatim Geocoding Provider
//!
//! ## Purpose
//! Interfaces with an OpenStreetMap Nominatim endpoint for forward and
//! reverse geocoding.
//!
//! ## Input/Output Specification
//! - **Input**: Free-form place names, coordinate pairs
//! - **Output**: Geocoding hits with parsed coordinates, reverse labels
//! - **Quirk**: Nominatim sends coordinates as JSON strings; they are parsed
//!   to finite floats here and dropped when unusable
//!
//! ## Key Features
//! - Bounded request timeout
//! - Identifying user agent on every request, per Nominatim usage policy
//! - Log-safe truncation of upstream error bodies

use super::{GeocodedPlace, GeocodingProvider, ReverseLocation};
use crate::config::GeocodingConfig;
use crate::errors::{LookupError, Result};
use crate::utils::TextUtils;
use crate::Coordinate;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER_NAME: &str = "nominatim";

/// OpenStreetMap Nominatim client
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

/// Wire format of one `/search` hit
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

/// Wire format of a `/reverse` response
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    address: Option<AddressDetails>,
}

#[derive(Debug, Deserialize)]
struct AddressDetails {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
}

impl NominatimClient {
    /// Create a new client from configuration
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| LookupError::Internal {
                message: format!("Failed to build geocoding HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn upstream_error(&self, details: String) -> LookupError {
        LookupError::UpstreamUnavailable {
            provider: PROVIDER_NAME.to_string(),
            details,
        }
    }

    /// Parse a stringly-typed coordinate, keeping only finite values
    fn parse_component(raw: &str) -> Option<f64> {
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(&self, place: &str, limit: usize) -> Result<Vec<GeocodedPlace>> {
        let url = format!("{}/search", self.base_url);
        let limit_param = limit.to_string();

        tracing::debug!("Geocoding '{}' via {}", place, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", place),
                ("format", "json"),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.upstream_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.upstream_error(format!(
                "HTTP {}: {}",
                status,
                TextUtils::truncate(&body, 200)
            )));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| self.upstream_error(format!("undecodable search response: {}", e)))?;

        Ok(hits
            .into_iter()
            .map(|hit| GeocodedPlace {
                lat: Self::parse_component(&hit.lat),
                lon: Self::parse_component(&hit.lon),
                display_name: hit.display_name,
            })
            .collect())
    }

    async fn reverse(&self, coord: Coordinate) -> Result<ReverseLocation> {
        let url = format!("{}/reverse", self.base_url);
        let lat = coord.lat.to_string();
        let lon = coord.lon.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| self.upstream_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.upstream_error(format!(
                "HTTP {}: {}",
                status,
                TextUtils::truncate(&body, 200)
            )));
        }

        let reverse: ReverseResponse = response
            .json()
            .await
            .map_err(|e| self.upstream_error(format!("undecodable reverse response: {}", e)))?;

        let locality = reverse
            .address
            .and_then(|a| a.city.or(a.town).or(a.village).or(a.hamlet));

        Ok(ReverseLocation {
            locality,
            display_name: reverse.display_name,
        })
    }
}

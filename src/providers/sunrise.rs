//! # Sunrise-Sunset Provider
//!
//! ## Purpose
//! Interfaces with the sunrise-sunset.org API, the service's source of sun
//! event data.
//!
//! ## Input/Output Specification
//! - **Input**: Coordinate pair, optional civil day
//! - **Output**: The provider's `results` object, passed through verbatim
//! - **Envelope**: `{status: "OK", results: {...}}`; any non-OK status is an
//!   upstream failure, whatever HTTP code carried it

use super::SunEventProvider;
use crate::config::SunApiConfig;
use crate::errors::{LookupError, Result};
use crate::utils::TextUtils;
use crate::{Coordinate, SunEventResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER_NAME: &str = "sunrise-sunset";

/// sunrise-sunset.org client
pub struct SunriseSunsetClient {
    client: Client,
    base_url: String,
}

/// Wire envelope of a `/json` response
#[derive(Debug, Deserialize)]
struct SunApiResponse {
    status: String,
    results: Option<serde_json::Value>,
}

impl SunriseSunsetClient {
    /// Create a new client from configuration
    pub fn new(config: &SunApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("sunspot-service/0.1")
            .build()
            .map_err(|e| LookupError::Internal {
                message: format!("Failed to build sun-event HTTP client: {}", e),
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
}

#[async_trait]
impl SunEventProvider for SunriseSunsetClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn lookup(&self, coord: Coordinate, date: Option<NaiveDate>) -> Result<SunEventResult> {
        let url = format!("{}/json", self.base_url);

        // formatted=0 asks for ISO 8601 timestamps instead of locale text
        let mut params = vec![
            ("lat", coord.lat.to_string()),
            ("lng", coord.lon.to_string()),
            ("formatted", "0".to_string()),
        ];
        if let Some(date) = date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }

        tracing::debug!(
            "Fetching sun events for {}, {} (date: {:?})",
            coord.lat,
            coord.lon,
            date
        );

        let response = self
            .client
            .get(&url)
            .query(&params)
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

        let envelope: SunApiResponse = response
            .json()
            .await
            .map_err(|e| self.upstream_error(format!("undecodable response: {}", e)))?;

        if envelope.status != "OK" {
            return Err(self.upstream_error(format!("provider status '{}'", envelope.status)));
        }

        let results = envelope
            .results
            .ok_or_else(|| self.upstream_error("missing results object".to_string()))?;

        Ok(SunEventResult(results))
    }
}

//! # Upstream Providers Module
//!
//! ## Purpose
//! Defines the common interfaces for the service's remote collaborators and
//! provides HTTP implementations for the production endpoints.
//!
//! ## Input/Output Specification
//! - **Input**: Place names, coordinate pairs, optional dates
//! - **Output**: Geocoding hits, reverse-lookup labels, sun-event payloads
//! - **Providers**: Nominatim (geocoding), sunrise-sunset.org (sun events)
//!
//! ## Architecture
//! - `GeocodingProvider` / `SunEventProvider` traits: the seams resolvers
//!   depend on; tests substitute stubs here
//! - `nominatim.rs`: OpenStreetMap Nominatim implementation
//! - `sunrise.rs`: sunrise-sunset.org implementation

pub mod nominatim;
pub mod sunrise;

use crate::errors::Result;
use crate::{Coordinate, SunEventResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single forward-geocoding hit.
///
/// Coordinates are optional on purpose: providers return hits without
/// usable positions, and the caller decides what that means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub display_name: Option<String>,
}

/// What a reverse lookup knows about a coordinate pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseLocation {
    /// Settlement-level name (city, town, village or hamlet)
    pub locality: Option<String>,
    /// Full display label
    pub display_name: Option<String>,
}

/// Trait for forward and reverse geocoding services
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Provider name for logs and error context
    fn name(&self) -> &str;

    /// Forward geocode a free-form place name, best match first
    async fn search(&self, place: &str, limit: usize) -> Result<Vec<GeocodedPlace>>;

    /// Reverse geocode a coordinate pair
    async fn reverse(&self, coord: Coordinate) -> Result<ReverseLocation>;
}

/// Trait for sun-event data services
#[async_trait]
pub trait SunEventProvider: Send + Sync {
    /// Provider name for logs and error context
    fn name(&self) -> &str;

    /// Fetch sun events for a coordinate pair, optionally for a specific
    /// civil day; providers default to the current day when none is given
    async fn lookup(&self, coord: Coordinate, date: Option<NaiveDate>) -> Result<SunEventResult>;
}

//! # Sunspot Lookup Service
//!
//! ## Overview
//! This library implements an HTTP service that resolves a place name or
//! coordinate pair plus a free-form date token into sunrise/sunset data,
//! caching upstream responses with a freshness-dependent TTL.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `date`: Date-token resolution and freshness classification
//! - `location`: Place-name geocoding and reverse-geocoded display labels
//! - `providers`: Upstream HTTP collaborators (geocoding, sun events)
//! - `storage`: Cache store backends (in-memory and sled)
//! - `cache`: Sun-data cache keyed by coordinates and canonical date
//! - `resolver`: Lookup orchestration and cache policy
//! - `instrument`: Observer hooks around the resolver's side effects
//! - `counter`: Visitor counter endpoint state
//! - `api`: REST API endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Place names or coordinates, optional date tokens
//! - **Output**: Sun-event payloads (JSON) with resolved location and date
//! - **Performance**: Cached lookups answer without touching upstreams
//!
//! ## Usage
//! ```rust,no_run
//! use sunspot_service::api::ApiServer;
//! use sunspot_service::{AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let state = AppState::from_config(config)?;
//!     ApiServer::new(state).run().await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod date;
pub mod providers;
pub mod storage;
pub mod cache;
pub mod instrument;
pub mod location;
pub mod resolver;
pub mod counter;
pub mod api;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{LookupError, Result};
pub use location::LocationResolver;
pub use resolver::SunspotResolver;

// Core types used throughout the system
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A latitude/longitude pair in decimal degrees.
///
/// Both components are guaranteed finite; construction rejects NaN and
/// infinities. No range clamping is applied beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite components.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(LookupError::InvalidInput {
                message: format!("coordinates must be finite, got ({}, {})", lat, lon),
            });
        }
        Ok(Self { lat, lon })
    }
}

/// Opaque sun-event payload, stored and returned exactly as the provider
/// sent it. The service never interprets individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SunEventResult(pub serde_json::Value);

/// Application state shared across components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub resolver: Arc<resolver::SunspotResolver>,
    pub locations: Arc<location::LocationResolver>,
    pub counter: Arc<counter::VisitorCounter>,
    pub store: Arc<dyn storage::CacheStore>,
}

impl AppState {
    /// Wire up every component from a validated configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let store: Arc<dyn storage::CacheStore> = match config.cache.backend.as_str() {
            "memory" => Arc::new(storage::MemoryStore::new(config.cache.max_memory_entries)),
            "sled" => Arc::new(storage::SledStore::open(
                &config.cache.sled_path,
                config.cache.enable_compression,
            )?),
            other => {
                return Err(LookupError::Config {
                    message: format!("unknown cache backend '{}'", other),
                })
            }
        };

        let geocoder: Arc<dyn providers::GeocodingProvider> =
            Arc::new(providers::nominatim::NominatimClient::new(&config.geocoding)?);
        let sun_provider: Arc<dyn providers::SunEventProvider> =
            Arc::new(providers::sunrise::SunriseSunsetClient::new(&config.sun)?);

        let sun_cache = cache::SunDataCache::new(Arc::clone(&store));
        let resolver = resolver::SunspotResolver::new(
            sun_cache,
            sun_provider,
            config.cache.ttl_today(),
            config.cache.ttl_other(),
        )
        .with_observer(Arc::new(instrument::TracingObserver));

        Ok(Self {
            config,
            resolver: Arc::new(resolver),
            locations: Arc::new(location::LocationResolver::new(
                geocoder,
                config.geocoding.result_limit,
            )),
            counter: Arc::new(counter::VisitorCounter::new()),
            store,
        })
    }
}

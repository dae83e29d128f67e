//! # Location Resolution Module
//!
//! ## Purpose
//! Turns place names into coordinates and coordinates into human-readable
//! labels, sitting between the API layer and the geocoding provider.
//!
//! ## Input/Output Specification
//! - **Input**: Free-form place names or coordinate pairs
//! - **Output**: Finite coordinates, or a display label for a pair
//! - **Errors**: `LocationNotFound` when nothing usable comes back; reverse
//!   lookups never fail
//!
//! ## Key Features
//! - First-hit-wins forward geocoding
//! - Label fallback chain: locality, display name, synthesized coordinates
//! - Provider failures on the reverse path degrade to the synthesized label

use crate::errors::{LookupError, Result};
use crate::providers::GeocodingProvider;
use crate::utils::GeoUtils;
use crate::Coordinate;
use std::sync::Arc;

/// Resolves place names and coordinate labels via a geocoding provider
pub struct LocationResolver {
    provider: Arc<dyn GeocodingProvider>,
    result_limit: usize,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>, result_limit: usize) -> Self {
        Self {
            provider,
            result_limit,
        }
    }

    /// Forward geocode `place` to coordinates.
    ///
    /// The first hit wins. A blank name, an empty result list or a first hit
    /// without usable coordinates all resolve to `LocationNotFound`; provider
    /// transport failures propagate as they are.
    pub async fn forward(&self, place: &str) -> Result<Coordinate> {
        let trimmed = place.trim();
        if trimmed.is_empty() {
            return Err(LookupError::LocationNotFound {
                place: place.to_string(),
            });
        }

        let hits = self.provider.search(trimmed, self.result_limit).await?;

        let first = hits.into_iter().next().ok_or_else(|| LookupError::LocationNotFound {
            place: trimmed.to_string(),
        })?;

        match (first.lat, first.lon) {
            (Some(lat), Some(lon)) => {
                let coord = Coordinate::new(lat, lon)?;
                tracing::debug!("Geocoded '{}' to {}, {}", trimmed, coord.lat, coord.lon);
                Ok(coord)
            }
            _ => Err(LookupError::LocationNotFound {
                place: trimmed.to_string(),
            }),
        }
    }

    /// Reverse geocode `coord` to a display label.
    ///
    /// Falls through locality, then the full display name, then a label
    /// synthesized from the coordinates themselves. Never fails.
    pub async fn reverse(&self, coord: Coordinate) -> String {
        match self.provider.reverse(coord).await {
            Ok(location) => location
                .locality
                .filter(|name| !name.is_empty())
                .or(location.display_name.filter(|name| !name.is_empty()))
                .unwrap_or_else(|| GeoUtils::coordinate_label(coord)),
            Err(e) => {
                tracing::warn!(
                    "Reverse geocoding failed for {}, {}: {}",
                    coord.lat,
                    coord.lon,
                    e
                );
                GeoUtils::coordinate_label(coord)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{GeocodedPlace, ReverseLocation};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Geocoder stub with canned answers and a call counter
    struct StubGeocoder {
        hits: Vec<GeocodedPlace>,
        reverse: Result<ReverseLocation>,
        search_calls: AtomicUsize,
    }

    impl StubGeocoder {
        fn with_hits(hits: Vec<GeocodedPlace>) -> Self {
            Self {
                hits,
                reverse: Ok(ReverseLocation {
                    locality: None,
                    display_name: None,
                }),
                search_calls: AtomicUsize::new(0),
            }
        }

        fn with_reverse(reverse: Result<ReverseLocation>) -> Self {
            Self {
                hits: Vec::new(),
                reverse,
                search_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GeocodingProvider for StubGeocoder {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(&self, _place: &str, _limit: usize) -> Result<Vec<GeocodedPlace>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.clone())
        }

        async fn reverse(&self, _coord: Coordinate) -> Result<ReverseLocation> {
            match &self.reverse {
                Ok(location) => Ok(location.clone()),
                Err(_) => Err(LookupError::UpstreamUnavailable {
                    provider: "stub".to_string(),
                    details: "down".to_string(),
                }),
            }
        }
    }

    fn coord() -> Coordinate {
        Coordinate {
            lat: 40.7128,
            lon: -74.006,
        }
    }

    #[tokio::test]
    async fn test_forward_takes_first_hit() {
        let stub = Arc::new(StubGeocoder::with_hits(vec![
            GeocodedPlace {
                lat: Some(51.5074),
                lon: Some(-0.1278),
                display_name: Some("London".to_string()),
            },
            GeocodedPlace {
                lat: Some(42.98),
                lon: Some(-81.25),
                display_name: Some("London, Ontario".to_string()),
            },
        ]));

        let resolver = LocationResolver::new(stub, 5);
        let coord = resolver.forward("London").await.unwrap();

        assert_eq!(coord.lat, 51.5074);
        assert_eq!(coord.lon, -0.1278);
    }

    #[tokio::test]
    async fn test_forward_empty_results_is_not_found() {
        let stub = Arc::new(StubGeocoder::with_hits(Vec::new()));
        let resolver = LocationResolver::new(stub, 1);

        let err = resolver.forward("Atlantis").await.unwrap_err();
        assert!(matches!(err, LookupError::LocationNotFound { .. }));
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_forward_hit_without_coordinates_is_not_found() {
        let stub = Arc::new(StubGeocoder::with_hits(vec![GeocodedPlace {
            lat: None,
            lon: Some(-0.1278),
            display_name: Some("Somewhere".to_string()),
        }]));
        let resolver = LocationResolver::new(stub, 1);

        let err = resolver.forward("Somewhere").await.unwrap_err();
        assert!(matches!(err, LookupError::LocationNotFound { .. }));
    }

    #[tokio::test]
    async fn test_forward_blank_place_skips_provider() {
        let stub = Arc::new(StubGeocoder::with_hits(Vec::new()));
        let resolver = LocationResolver::new(Arc::clone(&stub) as Arc<dyn GeocodingProvider>, 1);

        let err = resolver.forward("   ").await.unwrap_err();
        assert!(matches!(err, LookupError::LocationNotFound { .. }));
        assert_eq!(stub.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reverse_prefers_locality() {
        let stub = Arc::new(StubGeocoder::with_reverse(Ok(ReverseLocation {
            locality: Some("New York".to_string()),
            display_name: Some("New York, United States".to_string()),
        })));
        let resolver = LocationResolver::new(stub, 1);

        assert_eq!(resolver.reverse(coord()).await, "New York");
    }

    #[tokio::test]
    async fn test_reverse_falls_back_to_display_name() {
        let stub = Arc::new(StubGeocoder::with_reverse(Ok(ReverseLocation {
            locality: None,
            display_name: Some("Hudson River, United States".to_string()),
        })));
        let resolver = LocationResolver::new(stub, 1);

        assert_eq!(resolver.reverse(coord()).await, "Hudson River, United States");
    }

    #[tokio::test]
    async fn test_reverse_synthesizes_label_when_provider_fails() {
        let stub = Arc::new(StubGeocoder::with_reverse(Err(
            LookupError::UpstreamUnavailable {
                provider: "stub".to_string(),
                details: "down".to_string(),
            },
        )));
        let resolver = LocationResolver::new(stub, 1);

        assert_eq!(resolver.reverse(coord()).await, "40.7128, -74.0060");
    }

    #[tokio::test]
    async fn test_reverse_synthesizes_label_when_provider_knows_nothing() {
        let stub = Arc::new(StubGeocoder::with_reverse(Ok(ReverseLocation {
            locality: None,
            display_name: None,
        })));
        let resolver = LocationResolver::new(stub, 1);

        assert_eq!(resolver.reverse(coord()).await, "40.7128, -74.0060");
    }
}

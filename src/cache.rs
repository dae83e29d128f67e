//! # Sun Data Cache Module
//!
//! ## Purpose
//! Caching layer between the resolver and the configured [`CacheStore`]
//! backend. Owns key construction and payload encoding; a broken store
//! degrades lookups to misses instead of failing them.
//!
//! ## Input/Output Specification
//! - **Input**: Cache keys (coordinates + civil day), sun-event payloads,
//!   TTLs chosen by the caller
//! - **Output**: Cached payloads on hit, `None` on miss or store trouble
//! - **Guarantee**: No store failure ever propagates to a caller

use crate::storage::CacheStore;
use crate::{Coordinate, SunEventResult};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Identity of one cached lookup: where, and which civil day.
///
/// Keys derive from the resolved date, never the raw token, so `today`, a
/// blank token and the explicit ISO form of the current day all share one
/// store slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheKey {
    pub coord: Coordinate,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(coord: Coordinate, date: NaiveDate) -> Self {
        Self { coord, date }
    }

    /// Store slot name, stable across runs and backends
    pub fn storage_key(&self) -> String {
        format!("sun:{}:{}:{}", self.coord.lat, self.coord.lon, self.date)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Cache facade for sun-event payloads.
///
/// The TTL is decided by the caller; this layer only encodes, decodes and
/// shields callers from store failures.
pub struct SunDataCache {
    store: Arc<dyn CacheStore>,
}

impl SunDataCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Look up a payload. Store failures and undecodable entries both count
    /// as misses.
    pub async fn get(&self, key: &CacheKey) -> Option<SunEventResult> {
        let slot = key.storage_key();

        let bytes = match self.store.get(&slot).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", slot, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!("Discarding undecodable cache entry {}: {}", slot, e);
                None
            }
        }
    }

    /// Store a payload under `key` for `ttl`. Failures are logged and
    /// swallowed; the return value reports whether the write landed.
    pub async fn put(&self, key: &CacheKey, payload: &SunEventResult, ttl: Duration) -> bool {
        let slot = key.storage_key();

        let bytes = match serde_json::to_vec(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode payload for {}: {}", slot, e);
                return false;
            }
        };

        match self.store.set(&slot, bytes, ttl).await {
            Ok(()) => {
                tracing::debug!("Cached {} for {:?}", slot, ttl);
                true
            }
            Err(e) => {
                tracing::warn!("Cache write failed for {}: {}", slot, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{LookupError, Result};
    use crate::storage::{MemoryStore, StoreStats};
    use serde_json::json;

    fn coord() -> Coordinate {
        Coordinate {
            lat: 40.7128,
            lon: -74.006,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 22).unwrap()
    }

    fn payload() -> SunEventResult {
        SunEventResult(json!({
            "sunrise": "2026-08-22T10:14:00+00:00",
            "sunset": "2026-08-23T00:39:00+00:00",
            "day_length": 51900,
        }))
    }

    /// Store stub whose every operation fails
    struct FailingStore;

    #[async_trait::async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(LookupError::CacheUnavailable {
                details: "store down".to_string(),
            })
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
            Err(LookupError::CacheUnavailable {
                details: "store down".to_string(),
            })
        }

        async fn health_check(&self) -> Result<()> {
            Err(LookupError::CacheUnavailable {
                details: "store down".to_string(),
            })
        }

        async fn stats(&self) -> Result<StoreStats> {
            Err(LookupError::CacheUnavailable {
                details: "store down".to_string(),
            })
        }

        async fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_equivalent_tokens_share_a_slot() {
        let a = CacheKey::new(coord(), date());
        let b = CacheKey::new(Coordinate { lat: 40.7128, lon: -74.006 }, date());
        assert_eq!(a.storage_key(), b.storage_key());
        assert_eq!(a, b);
    }

    #[test]
    fn test_storage_key_format() {
        let key = CacheKey::new(coord(), date());
        assert_eq!(key.storage_key(), "sun:40.7128:-74.006:2026-08-22");
        assert_eq!(key.to_string(), key.storage_key());
    }

    #[test]
    fn test_distinct_dates_get_distinct_slots() {
        let a = CacheKey::new(coord(), date());
        let b = CacheKey::new(coord(), NaiveDate::from_ymd_opt(2026, 8, 23).unwrap());
        assert_ne!(a.storage_key(), b.storage_key());
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let cache = SunDataCache::new(Arc::new(MemoryStore::new(16)));
        let key = CacheKey::new(coord(), date());

        assert!(cache.put(&key, &payload(), Duration::from_secs(60)).await);
        assert_eq!(cache.get(&key).await, Some(payload()));
    }

    #[tokio::test]
    async fn test_miss_on_absent_key() {
        let cache = SunDataCache::new(Arc::new(MemoryStore::new(16)));
        assert_eq!(cache.get(&CacheKey::new(coord(), date())).await, None);
    }

    #[tokio::test]
    async fn test_failing_store_degrades_to_miss() {
        let cache = SunDataCache::new(Arc::new(FailingStore));
        let key = CacheKey::new(coord(), date());

        assert_eq!(cache.get(&key).await, None);
        assert!(!cache.put(&key, &payload(), Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_undecodable_entry_counts_as_miss() {
        let store = Arc::new(MemoryStore::new(16));
        let key = CacheKey::new(coord(), date());

        store
            .set(&key.storage_key(), b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let cache = SunDataCache::new(store);
        assert_eq!(cache.get(&key).await, None);
    }
}

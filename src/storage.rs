//! # Cache Store Module
//!
//! ## Purpose
//! Key/value backends for cached sun-event payloads. The resolver talks to
//! the [`CacheStore`] trait only; which backend sits behind it is a
//! deployment decision made in configuration.
//!
//! ## Input/Output Specification
//! - **Input**: String keys, opaque byte payloads, per-entry TTLs
//! - **Output**: Unexpired payloads, backend diagnostics
//! - **Storage**: In-memory map or sled embedded database
//!
//! ## Key Features
//! - Per-entry expiry enforced on read; stale slots are removed lazily
//! - Optional gzip compression of persisted payloads
//! - Write/read/remove health probe per backend
//! - Capacity-bounded memory backend

use crate::errors::{LookupError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Abstract expiring key/value store.
///
/// Implementations must be safe to share across request handlers. A `get`
/// never returns an expired payload; whether the stale slot is physically
/// reclaimed immediately is up to the backend.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the payload at `key` if present and unexpired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` at `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Verify the backend answers basic operations
    async fn health_check(&self) -> Result<()>;

    /// Entry count and backend identity for diagnostics
    async fn stats(&self) -> Result<StoreStats>;

    /// Persist buffered writes where the backend has any
    async fn flush(&self) -> Result<()>;
}

/// Store diagnostics surfaced by the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub backend: &'static str,
    pub entries: usize,
}

/// In-memory store backed by a concurrent map.
///
/// Entries expire lazily on read. When the map is full, expired entries are
/// swept first and the entry closest to expiry is dropped if that was not
/// enough.
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
    max_entries: usize,
}

struct StoredValue {
    payload: Vec<u8>,
    expires_at: Instant,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.payload.clone()));
                }
                true
            }
            None => false,
        };

        // The read guard is gone here; removing inside the match would
        // deadlock on the shard lock.
        if expired {
            self.entries.remove(key);
            tracing::debug!("Evicted expired cache entry: {}", key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        if self.entries.len() >= self.max_entries {
            let now = Instant::now();
            self.entries.retain(|_, v| v.expires_at > now);

            if self.entries.len() >= self.max_entries {
                let victim = self
                    .entries
                    .iter()
                    .min_by_key(|entry| entry.value().expires_at)
                    .map(|entry| entry.key().clone());
                if let Some(victim) = victim {
                    self.entries.remove(&victim);
                    tracing::debug!("Cache full, dropped entry closest to expiry: {}", victim);
                }
            }
        }

        self.entries.insert(
            key.to_string(),
            StoredValue {
                payload: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let key = "__health_check__";
        self.entries.insert(
            key.to_string(),
            StoredValue {
                payload: b"ok".to_vec(),
                expires_at: Instant::now() + Duration::from_secs(1),
            },
        );
        if self.entries.get(key).is_none() {
            return Err(LookupError::CacheUnavailable {
                details: "memory store health probe missing after insert".to_string(),
            });
        }
        self.entries.remove(key);
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let now = Instant::now();
        let entries = self
            .entries
            .iter()
            .filter(|entry| entry.value().expires_at > now)
            .count();
        Ok(StoreStats {
            backend: "memory",
            entries,
        })
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Persistent store on a sled tree.
///
/// Every record is a bincode [`Envelope`] carrying the expiry stamp chosen
/// at write time, so the TTL survives process restarts.
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
    enable_compression: bool,
}

/// On-disk record layout
#[derive(Serialize, Deserialize)]
struct Envelope {
    expires_at_ms: i64,
    compressed: bool,
    payload: Vec<u8>,
}

impl SledStore {
    /// Open (or create) the cache database at `path`
    pub fn open<P: AsRef<Path>>(path: P, enable_compression: bool) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(path).map_err(|e| LookupError::CacheUnavailable {
            details: format!("failed to open cache db at {:?}: {}", path, e),
        })?;

        let tree = db
            .open_tree("sun_cache")
            .map_err(|e| LookupError::CacheUnavailable {
                details: format!("failed to open cache tree: {}", e),
            })?;

        tracing::info!(
            "Sled cache store opened at {:?} with {} entries",
            path,
            tree.len()
        );

        Ok(Self {
            db,
            tree,
            enable_compression,
        })
    }

    fn compress(data: &[u8]) -> Result<Vec<u8>> {
        use std::io::Write;

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).map_err(|e| LookupError::Internal {
            message: format!("Compression failed: {}", e),
        })?;
        encoder.finish().map_err(|e| LookupError::Internal {
            message: format!("Compression finish failed: {}", e),
        })
    }

    fn decompress(data: &[u8]) -> Result<Vec<u8>> {
        use std::io::Read;

        let mut decoder = flate2::read::GzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| LookupError::Internal {
                message: format!("Decompression failed: {}", e),
            })?;
        Ok(decompressed)
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[async_trait]
impl CacheStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let raw = match self.tree.get(key.as_bytes())? {
            Some(value) => value,
            None => return Ok(None),
        };

        let envelope: Envelope = bincode::deserialize(&raw)?;

        if envelope.expires_at_ms <= Self::now_ms() {
            self.tree.remove(key.as_bytes())?;
            tracing::debug!("Evicted expired cache entry: {}", key);
            return Ok(None);
        }

        let payload = if envelope.compressed {
            Self::decompress(&envelope.payload)?
        } else {
            envelope.payload
        };
        Ok(Some(payload))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let payload = if self.enable_compression {
            Self::compress(&value)?
        } else {
            value
        };

        let envelope = Envelope {
            expires_at_ms: Self::now_ms() + ttl.as_millis() as i64,
            compressed: self.enable_compression,
            payload,
        };

        let bytes = bincode::serialize(&envelope)?;
        self.tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let test_key = b"__health_check__";
        let test_value = b"ok";

        self.tree
            .insert(test_key, test_value)
            .map_err(|e| LookupError::CacheUnavailable {
                details: format!("health check write failed: {}", e),
            })?;

        let result = self
            .tree
            .get(test_key)
            .map_err(|e| LookupError::CacheUnavailable {
                details: format!("health check read failed: {}", e),
            })?;

        if result.is_none() {
            return Err(LookupError::CacheUnavailable {
                details: "health check value not found".to_string(),
            });
        }

        self.tree
            .remove(test_key)
            .map_err(|e| LookupError::CacheUnavailable {
                details: format!("health check cleanup failed: {}", e),
            })?;

        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            backend: "sled",
            entries: self.tree.len(),
        })
    }

    async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| LookupError::CacheUnavailable {
                details: format!("flush failed: {}", e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new(16);
        store
            .set("sun:1:2:2026-08-22", b"payload".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let value = store.get("sun:1:2:2026-08-22").await.unwrap();
        assert_eq!(value, Some(b"payload".to_vec()));
        assert_eq!(store.get("sun:other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expires_entries() {
        let store = MemoryStore::new(16);
        store
            .set("k", b"v".to_vec(), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.stats().await.unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_memory_store_respects_capacity() {
        let store = MemoryStore::new(2);
        for i in 0..5 {
            store
                .set(&format!("k{}", i), vec![i], Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert!(store.stats().await.unwrap().entries <= 2);
    }

    #[tokio::test]
    async fn test_memory_store_health_check() {
        let store = MemoryStore::new(16);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_sled_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path().join("cache.db"), false).unwrap();

        store
            .set("sun:40.7:-74:2026-08-22", b"{\"sunrise\":\"x\"}".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let value = store.get("sun:40.7:-74:2026-08-22").await.unwrap();
        assert_eq!(value, Some(b"{\"sunrise\":\"x\"}".to_vec()));
    }

    #[tokio::test]
    async fn test_sled_store_compression_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path().join("cache.db"), true).unwrap();

        let payload = vec![b'a'; 4096];
        store
            .set("big", payload.clone(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("big").await.unwrap(), Some(payload));
    }

    #[tokio::test]
    async fn test_sled_store_expires_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path().join("cache.db"), false).unwrap();

        store
            .set("k", b"v".to_vec(), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.stats().await.unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_sled_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let store = SledStore::open(&path, true).unwrap();
            store
                .set("persisted", b"still here".to_vec(), Duration::from_secs(3600))
                .await
                .unwrap();
            store.flush().await.unwrap();
        }

        let reopened = SledStore::open(&path, true).unwrap();
        assert_eq!(
            reopened.get("persisted").await.unwrap(),
            Some(b"still here".to_vec())
        );
    }

    #[tokio::test]
    async fn test_sled_store_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path().join("cache.db"), false).unwrap();
        assert!(store.health_check().await.is_ok());
    }
}

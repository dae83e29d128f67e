//! # Sunspot Resolver Module
//!
//! ## Purpose
//! Orchestrates a full sunspot lookup: resolve the date token, consult the
//! cache, fall back to the upstream provider, and store the fresh payload
//! with a freshness-dependent TTL.
//!
//! ## Input/Output Specification
//! - **Input**: A coordinate pair and an optional free-form date token
//! - **Output**: The provider payload plus the resolved date
//! - **Errors**: `InvalidDate` before any collaborator is touched,
//!   `UpstreamUnavailable` when the provider fails on a cache miss
//!
//! ## Key Features
//! - Cache-first lookup keyed by coordinates and canonical date
//! - Short TTL for the still-moving current day, long TTL for settled days
//! - Cache outages degrade to provider fetches instead of failing requests
//! - Observer hooks around every cache and provider interaction

use crate::cache::{CacheKey, SunDataCache};
use crate::date::{self, ResolvedDate};
use crate::errors::Result;
use crate::instrument::{LookupObserver, LookupStep, NoopObserver, StepOutcome};
use crate::providers::SunEventProvider;
use crate::utils::Timer;
use crate::{Coordinate, SunEventResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Snapshot of resolver counters
#[derive(Debug, Clone, Serialize)]
pub struct ResolverStats {
    pub lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub provider_failures: u64,
}

/// Cache-first lookup orchestrator for sun-event data
pub struct SunspotResolver {
    cache: SunDataCache,
    provider: Arc<dyn SunEventProvider>,
    ttl_today: Duration,
    ttl_other: Duration,
    observer: Arc<dyn LookupObserver>,
    lookups: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    provider_failures: AtomicU64,
}

impl SunspotResolver {
    pub fn new(
        cache: SunDataCache,
        provider: Arc<dyn SunEventProvider>,
        ttl_today: Duration,
        ttl_other: Duration,
    ) -> Self {
        Self {
            cache,
            provider,
            ttl_today,
            ttl_other,
            observer: Arc::new(NoopObserver),
            lookups: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            provider_failures: AtomicU64::new(0),
        }
    }

    /// Replace the default no-op observer.
    pub fn with_observer(mut self, observer: Arc<dyn LookupObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Resolve a lookup against the current UTC day.
    pub async fn resolve(
        &self,
        coord: Coordinate,
        token: Option<&str>,
    ) -> Result<(SunEventResult, ResolvedDate)> {
        self.resolve_at(coord, token, date::today_utc()).await
    }

    /// Resolve a lookup against an explicit reference day.
    ///
    /// The date token is settled first; a token that does not parse fails the
    /// lookup before the cache or the provider sees anything. On a miss the
    /// provider payload is stored under the resolved key, with the short TTL
    /// when the resolved day is the reference day and the long TTL otherwise.
    pub async fn resolve_at(
        &self,
        coord: Coordinate,
        token: Option<&str>,
        reference: NaiveDate,
    ) -> Result<(SunEventResult, ResolvedDate)> {
        let resolved = date::resolve(token, reference)?;
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let timer = Timer::new("sunspot_lookup");
        let key = CacheKey::new(coord, resolved.date);

        self.observer.step_began(LookupStep::CacheGet);
        if let Some(payload) = self.cache.get(&key).await {
            self.observer
                .step_finished(LookupStep::CacheGet, StepOutcome::Hit);
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit for {} in {}ms", key, timer.elapsed_ms());
            return Ok((payload, resolved));
        }
        self.observer
            .step_finished(LookupStep::CacheGet, StepOutcome::Miss);
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        self.observer.step_began(LookupStep::ProviderFetch);
        let payload = match self.provider.lookup(coord, Some(resolved.date)).await {
            Ok(payload) => {
                self.observer
                    .step_finished(LookupStep::ProviderFetch, StepOutcome::Completed);
                payload
            }
            Err(e) => {
                self.observer
                    .step_finished(LookupStep::ProviderFetch, StepOutcome::Failed);
                self.provider_failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        // The current day's events keep shifting until it is over; settled
        // days never change, so they earn the long TTL.
        let ttl = if resolved.is_today() {
            self.ttl_today
        } else {
            self.ttl_other
        };

        self.observer.step_began(LookupStep::CachePut);
        let stored = self.cache.put(&key, &payload, ttl).await;
        let outcome = if stored {
            StepOutcome::Completed
        } else {
            StepOutcome::Failed
        };
        self.observer.step_finished(LookupStep::CachePut, outcome);

        tracing::debug!(
            "Fetched {} from provider in {}ms (ttl {}s)",
            key,
            timer.elapsed_ms(),
            ttl.as_secs()
        );
        Ok((payload, resolved))
    }

    /// Get resolver statistics
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
        }
    }
}

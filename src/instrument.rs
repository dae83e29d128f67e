//! # Instrumentation Module
//!
//! ## Purpose
//! Observer callbacks around the resolver's side-effecting steps. Tracing,
//! metrics or test probes attach here instead of being woven through the
//! lookup logic itself.

/// A side-effecting step of one sunspot resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStep {
    /// Reading the cache slot for the resolved key
    CacheGet,
    /// Fetching from the upstream sun-event provider
    ProviderFetch,
    /// Writing the fetched payload back to the cache
    CachePut,
}

/// How a step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Cache read found a usable entry
    Hit,
    /// Cache read found nothing usable
    Miss,
    /// Step completed normally
    Completed,
    /// Step failed; for cache writes the failure was swallowed
    Failed,
}

/// Callbacks fired around each side-effecting lookup step.
///
/// Implementations run inline on the request path and must be cheap and
/// non-blocking. Both methods default to no-ops so observers can pick
/// which edge they care about.
pub trait LookupObserver: Send + Sync {
    fn step_began(&self, _step: LookupStep) {}

    fn step_finished(&self, _step: LookupStep, _outcome: StepOutcome) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl LookupObserver for NoopObserver {}

/// Observer that emits a `tracing` debug event per step edge
pub struct TracingObserver;

impl LookupObserver for TracingObserver {
    fn step_began(&self, step: LookupStep) {
        tracing::debug!("Lookup step began: {:?}", step);
    }

    fn step_finished(&self, step: LookupStep, outcome: StepOutcome) {
        tracing::debug!("Lookup step finished: {:?} -> {:?}", step, outcome);
    }
}

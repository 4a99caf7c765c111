//! Counters for advice resolution and wiring.
//!
//! - `CacheMetrics` is updated on the request path, so it is atomic and
//!   lock-free. `snapshot` gives a plain copy for reporting.
//! - `WiringReport` is produced once by the build-time wiring pass.

use std::sync::atomic::{AtomicU64, Ordering};

// --- Cache metrics -----------------------------------------------------------

#[derive(Debug, Default)]
pub struct CacheMetrics {
    lookups: AtomicU64,
    hits: AtomicU64,
    computations: AtomicU64,
}

impl CacheMetrics {
    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_computation(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheMetrics`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Calls to `resolve`.
    pub lookups: u64,
    /// Lookups answered by an entry that was already computed.
    pub hits: u64,
    /// Filtering passes actually run; at most one per distinct key.
    pub computations: u64,
}

// --- Wiring report -----------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WiringReport {
    /// Aspects considered by the pass.
    pub aspects: usize,
    /// Aspects whose pointcut only constrains resource names.
    pub resource_only_aspects: usize,
    /// Resources that received at least one registry.
    pub wired_resources: usize,
    /// Aspect-to-scope attachments, summed over all resources.
    pub attachments: usize,
    /// Handlers flagged for proxy interception.
    pub proxied_handlers: usize,
    /// Ids of resource-only aspects that matched no resource.
    pub unmatched_aspects: Vec<String>,
}

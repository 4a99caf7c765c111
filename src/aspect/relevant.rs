//! Memoized advice per joinpoint.
//!
//! ```text
//! resolve("/orders", "orderService", "place")
//!     │
//!     ├─ key "/orders/orderService/place" ── entries (DashMap)
//!     │        │
//!     │        └─ Arc<OnceCell<..>> ── get_or_init ── compute (first caller only)
//!     │                                               - every declared aspect
//!     │                                               - pointcut test on the triple
//!     │                                               - register into a fresh registry
//!     v
//! Arc<AdviceRuleRegistry>
//! ```
//!
//! ## Invariants
//!
//! - At most one computation per key. The map lock is held only to fetch or
//!   create the key's cell; the computation runs inside `OnceCell::get_or_init`,
//!   so concurrent first callers for the same key wait for one result and
//!   callers for other keys are not blocked.
//! - Entries are never evicted.
//! - Candidates keep declaration order, so phase lists are identical no matter
//!   which thread computed them.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::trace;

use super::{AdviceRuleRegistry, AspectRule, CacheMetrics};
use crate::pointcut;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinpointKey {
    pub resource: String,
    pub handler: String,
    pub operation: String,
}

impl JoinpointKey {
    pub fn new(resource: &str, handler: &str, operation: &str) -> Self {
        JoinpointKey { resource: resource.to_string(), handler: handler.to_string(), operation: operation.to_string() }
    }
}

impl fmt::Display for JoinpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.resource, self.handler, self.operation)
    }
}

type Slot = Arc<OnceCell<Arc<AdviceRuleRegistry>>>;

#[derive(Debug)]
pub struct RelevantAdviceCache {
    candidates: Vec<Arc<AspectRule>>,
    entries: DashMap<JoinpointKey, Slot>,
    metrics: CacheMetrics,
}

impl RelevantAdviceCache {
    /// Build over every declared aspect. Resource-only aspects are tested here
    /// too, by resource name, even though wiring also attaches them to scopes.
    pub fn new(aspects: &[Arc<AspectRule>]) -> Self {
        let candidates = aspects.to_vec();
        RelevantAdviceCache { candidates, entries: DashMap::new(), metrics: CacheMetrics::default() }
    }

    /// The advice that applies to `(resource, handler, operation)`.
    pub fn resolve(&self, resource: &str, handler: &str, operation: &str) -> Arc<AdviceRuleRegistry> {
        self.metrics.record_lookup();
        let key = JoinpointKey::new(resource, handler, operation);

        let slot: Slot = match self.entries.get(&key) {
            Some(existing) => Arc::clone(existing.value()),
            None => Arc::clone(self.entries.entry(key.clone()).or_default().value()),
        };

        let mut computed = false;
        let registry = slot.get_or_init(|| {
            computed = true;
            Arc::new(self.compute(&key))
        });
        if !computed {
            self.metrics.record_hit();
        }
        Arc::clone(registry)
    }

    fn compute(&self, key: &JoinpointKey) -> AdviceRuleRegistry {
        self.metrics.record_computation();
        let mut registry = AdviceRuleRegistry::new();
        for aspect in &self.candidates {
            if pointcut::applies(aspect.pointcut.as_deref(), &key.resource, &key.handler, &key.operation) {
                registry.register(aspect);
            }
        }
        trace!(joinpoint = %key, aspects = registry.matched_aspect_count(), "resolved relevant advice");
        registry
    }

    pub fn contains(&self, resource: &str, handler: &str, operation: &str) -> bool {
        self.entries.contains_key(&JoinpointKey::new(resource, handler, operation))
    }

    /// Number of distinct joinpoints seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn candidates(&self) -> &[Arc<AspectRule>] {
        &self.candidates
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

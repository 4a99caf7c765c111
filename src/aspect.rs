//! Aspects, advice registries and their resolution.
//!
//! An aspect bundles advice (actions tagged with a phase) with a pointcut that
//! says where the advice applies. This module turns declared aspects into
//! ordered registries, once per resource at build time and lazily per
//! joinpoint at request time:
//!
//! ```text
//! AspectDeclaration ── AspectRule::from_declaration        (rule.rs)
//!                            │
//!              ┌─────────────┴───────────────┐
//!              │ resource-only               │ every aspect
//!              v                             v
//!   AdviceWiring::register_resources   RelevantAdviceCache::resolve
//!     (wiring.rs, build time)            (relevant.rs, request time)
//!              │                             │
//!              └────────────┬────────────────┘
//!                           v
//!                 AdviceRuleRegistry                 (registry.rs)
//!                   before / after / finally / thrown
//! ```
//!
//! ## Responsibilities by module
//!
//! - `rule.rs`: advice and aspect rules, joinpoint tokens, and the raw `serde`
//!   declarations they are built from.
//! - `registry.rs`: phase buckets with unwinding order.
//! - `relevant.rs`: the concurrent per-joinpoint memo.
//! - `wiring.rs`: build-time attachment to resource scopes and proxy flagging.
//! - `metrics.rs`: cache counters and the wiring report.
//!
//! ## Invariants
//!
//! - Only resource-only aspects are attached by the wiring pass. The
//!   relevant-advice cache tests every aspect against the joinpoint, so
//!   `resolve` returns resource-only advice as well.
//! - Registries are built by `register` only, so phase order depends solely on
//!   the order aspects are registered in.

#[path = "aspect/metrics.rs"]
mod metrics;
#[path = "aspect/registry.rs"]
mod registry;
#[path = "aspect/relevant.rs"]
mod relevant;
#[path = "aspect/rule.rs"]
mod rule;
#[path = "aspect/wiring.rs"]
mod wiring;

#[allow(unused_imports)]
pub use metrics::{CacheMetrics, CacheSnapshot, WiringReport};
#[allow(unused_imports)]
pub use registry::AdviceRuleRegistry;
#[allow(unused_imports)]
pub use relevant::{JoinpointKey, RelevantAdviceCache};
#[allow(unused_imports)]
pub use rule::{
    AdviceDeclaration, AdviceRule, AdviceType, AspectDeclaration, AspectRule, DEFAULT_ORDER, JoinpointDeclaration,
    JoinpointRule, JoinpointScope, JoinpointTarget, MethodTypes,
};
#[allow(unused_imports)]
pub use wiring::{AdviceWiring, HandlerDeclaration, HandlerRule, PreparedAspect, ResourceDeclaration, ResourceRule};

//! Phase buckets of advice for one joinpoint.
//!
//! ```text
//! register(aspect A: before a1, after a2)
//! register(aspect B: before b1, after b2, around b3)
//!
//! before:  [a1, b1, b3]        declaration order
//! after:   [b3, b2, a2]        reverse declaration order
//! ```
//!
//! `after`, `finally` and `thrown` unwind in reverse of `before`: the last
//! aspect entered is the first one exited. `around` advice lands in both
//! `before` and `after`, each with that phase's ordering.
//!
//! ## Ordering with explicit aspect orders
//!
//! Lower `aspect_order` runs its `before` advice earlier and its `after` /
//! `finally` advice later. Among equal orders the plain rules above hold
//! exactly (append for `before`, head insertion for `after` / `finally`).
//! `thrown` advice is always head-inserted.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{AdviceRule, AdviceType, AspectRule};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdviceRuleRegistry {
    settings: Map<String, Value>,
    before: Vec<Arc<AdviceRule>>,
    after: Vec<Arc<AdviceRule>>,
    finally: Vec<Arc<AdviceRule>>,
    thrown: Vec<Arc<AdviceRule>>,
    matched_aspect_count: u32,
}

impl AdviceRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold all advice and settings of `aspect` into this registry.
    pub fn register(&mut self, aspect: &AspectRule) {
        self.settings.extend(aspect.settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        for advice in &aspect.advice {
            self.add_advice(Arc::clone(advice));
        }
        self.matched_aspect_count += 1;
    }

    /// Bucket one advice rule by its phase.
    pub fn add_advice(&mut self, advice: Arc<AdviceRule>) {
        match advice.advice_type {
            AdviceType::Before => self.add_before(advice),
            AdviceType::After => insert_unwinding(&mut self.after, advice),
            AdviceType::Around => {
                self.add_before(Arc::clone(&advice));
                insert_unwinding(&mut self.after, advice);
            }
            AdviceType::Finally => insert_unwinding(&mut self.finally, advice),
            AdviceType::Thrown => self.thrown.insert(0, advice),
        }
    }

    fn add_before(&mut self, advice: Arc<AdviceRule>) {
        let order = advice.aspect_order;
        let index = self.before.iter().position(|r| order < r.aspect_order).unwrap_or(self.before.len());
        self.before.insert(index, advice);
    }

    /// Fold another registry in with the same ordering rules.
    ///
    /// Phase lists are replayed in stored order: `other.after` is already
    /// unwound, so it is replayed back to front to keep its relative order.
    pub fn merge(&mut self, other: &AdviceRuleRegistry) {
        self.settings.extend(other.settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        for advice in &other.before {
            self.add_before(Arc::clone(advice));
        }
        for advice in other.after.iter().rev() {
            insert_unwinding(&mut self.after, Arc::clone(advice));
        }
        for advice in other.finally.iter().rev() {
            insert_unwinding(&mut self.finally, Arc::clone(advice));
        }
        for advice in other.thrown.iter().rev() {
            self.thrown.insert(0, Arc::clone(advice));
        }
        self.matched_aspect_count += other.matched_aspect_count;
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    pub fn setting(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }

    pub fn before(&self) -> &[Arc<AdviceRule>] {
        &self.before
    }

    pub fn after(&self) -> &[Arc<AdviceRule>] {
        &self.after
    }

    pub fn finally(&self) -> &[Arc<AdviceRule>] {
        &self.finally
    }

    pub fn thrown(&self) -> &[Arc<AdviceRule>] {
        &self.thrown
    }

    /// Number of aspects registered, including those that contributed no advice.
    pub fn matched_aspect_count(&self) -> u32 {
        self.matched_aspect_count
    }

    /// No advice in any phase.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty() && self.finally.is_empty() && self.thrown.is_empty()
    }
}

/// Insert ahead of the first rule whose order is not greater than ours.
fn insert_unwinding(list: &mut Vec<Arc<AdviceRule>>, advice: Arc<AdviceRule>) {
    let order = advice.aspect_order;
    let index = list.iter().position(|r| order >= r.aspect_order).unwrap_or(list.len());
    list.insert(index, advice);
}

//! Build-time attachment of advice to resources and handlers.
//!
//! ```text
//! aspects ── AdviceWiring::new ── PreparedAspect { rule, resource_only }
//!                  │
//!                  ├─ register_resources(&mut [ResourceRule])
//!                  │     resource-only aspects whose pointcut matches the name:
//!                  │       scope resource  -> ResourceRule::advice
//!                  │       scope request   -> ResourceRule::request_advice
//!                  │       scope content   -> ResourceRule::content_advice
//!                  │       scope response  -> ResourceRule::response_advice
//!                  │
//!                  └─ register_handlers(&mut [HandlerRule])
//!                        handler-relevant aspect selects a proxiable handler
//!                          -> HandlerRule::requires_proxy = true
//! ```
//!
//! Aspects that are not resource-only are left to `RelevantAdviceCache`, which
//! resolves them per (resource, handler, operation) at request time.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{AdviceRuleRegistry, AspectRule, JoinpointScope, JoinpointTarget, WiringReport};

// --- Scope owners ------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ResourceRule {
    pub name: String,
    pub advice: Option<AdviceRuleRegistry>,
    pub request_advice: Option<AdviceRuleRegistry>,
    pub content_advice: Option<AdviceRuleRegistry>,
    pub response_advice: Option<AdviceRuleRegistry>,
}

impl ResourceRule {
    pub fn new(name: impl Into<String>) -> Self {
        ResourceRule { name: name.into(), ..Default::default() }
    }

    pub fn registry(&self, scope: JoinpointScope) -> Option<&AdviceRuleRegistry> {
        match scope {
            JoinpointScope::Resource => self.advice.as_ref(),
            JoinpointScope::Request => self.request_advice.as_ref(),
            JoinpointScope::Content => self.content_advice.as_ref(),
            JoinpointScope::Response => self.response_advice.as_ref(),
        }
    }

    /// The registry for `scope`, created on first use.
    pub fn touch_registry(&mut self, scope: JoinpointScope) -> &mut AdviceRuleRegistry {
        let slot = match scope {
            JoinpointScope::Resource => &mut self.advice,
            JoinpointScope::Request => &mut self.request_advice,
            JoinpointScope::Content => &mut self.content_advice,
            JoinpointScope::Response => &mut self.response_advice,
        };
        slot.get_or_insert_with(AdviceRuleRegistry::new)
    }

    pub fn has_advice(&self) -> bool {
        self.advice.is_some()
            || self.request_advice.is_some()
            || self.content_advice.is_some()
            || self.response_advice.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerRule {
    pub id: String,
    pub class_name: Option<String>,
    /// Operation names the handler exposes.
    pub operations: Vec<String>,
    /// Whether the handler may be wrapped at all.
    pub proxiable: bool,
    pub requires_proxy: bool,
}

impl HandlerRule {
    pub fn new(id: impl Into<String>) -> Self {
        HandlerRule { id: id.into(), proxiable: true, ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    #[serde(alias = "translet")]
    pub name: String,
}

impl From<&ResourceDeclaration> for ResourceRule {
    fn from(decl: &ResourceDeclaration) -> Self {
        ResourceRule::new(decl.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDeclaration {
    pub id: String,
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default = "default_proxiable")]
    pub proxiable: bool,
}

fn default_proxiable() -> bool {
    true
}

impl From<&HandlerDeclaration> for HandlerRule {
    fn from(decl: &HandlerDeclaration) -> Self {
        HandlerRule {
            id: decl.id.clone(),
            class_name: decl.class_name.clone(),
            operations: decl.operations.clone(),
            proxiable: decl.proxiable,
            requires_proxy: false,
        }
    }
}

// --- Wiring ------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PreparedAspect {
    pub rule: Arc<AspectRule>,
    pub resource_only: bool,
}

impl PreparedAspect {
    /// Whether this aspect can select handlers, and so may force a proxy.
    pub fn is_handler_relevant(&self) -> bool {
        match self.rule.joinpoint.target {
            JoinpointTarget::Handler => true,
            JoinpointTarget::Resource => !self.resource_only,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdviceWiring {
    aspects: Vec<PreparedAspect>,
}

impl AdviceWiring {
    pub fn new(aspects: &[Arc<AspectRule>]) -> Self {
        let aspects = aspects
            .iter()
            .map(|rule| {
                let prepared = PreparedAspect { rule: Arc::clone(rule), resource_only: rule.is_resource_only() };
                trace!(aspect = %rule.id, resource_only = prepared.resource_only, "prepared aspect");
                prepared
            })
            .collect();
        AdviceWiring { aspects }
    }

    pub fn aspects(&self) -> &[PreparedAspect] {
        &self.aspects
    }

    /// Attach resource-only aspects to the scopes of every matching resource.
    pub fn register_resources(&self, resources: &mut [ResourceRule]) -> WiringReport {
        let mut report = WiringReport {
            aspects: self.aspects.len(),
            resource_only_aspects: self.aspects.iter().filter(|a| a.resource_only).count(),
            ..Default::default()
        };

        let mut matched = vec![0usize; self.aspects.len()];
        for resource in resources.iter_mut() {
            for (idx, aspect) in self.aspects.iter().enumerate() {
                if !aspect.resource_only {
                    continue;
                }
                let rule = &aspect.rule;
                if !rule.pointcut.as_deref().is_none_or(|p| p.matches(&resource.name)) {
                    continue;
                }
                let scope = rule.joinpoint.scope;
                resource.touch_registry(scope).register(rule);
                matched[idx] += 1;
                report.attachments += 1;
                trace!(aspect = %rule.id, resource = %resource.name, %scope, "attached aspect");
            }
            if resource.has_advice() {
                report.wired_resources += 1;
            }
        }

        for (aspect, count) in self.aspects.iter().zip(&matched) {
            if aspect.resource_only && *count == 0 {
                if aspect.rule.pointcut.is_some() {
                    warn!(aspect = %aspect.rule.id, "no resources matched the aspect's pointcut");
                }
                report.unmatched_aspects.push(aspect.rule.id.clone());
            }
        }

        debug!(
            resources = resources.len(),
            wired = report.wired_resources,
            attachments = report.attachments,
            "registered resource advice"
        );
        report
    }

    /// Flag proxiable handlers selected by any handler-relevant aspect.
    /// Returns the number of handlers flagged.
    pub fn register_handlers(&self, handlers: &mut [HandlerRule]) -> usize {
        let mut proxied = 0;
        for handler in handlers.iter_mut().filter(|h| h.proxiable) {
            let selecting = self.aspects.iter().filter(|a| a.is_handler_relevant()).find(|a| {
                a.rule.pointcut.as_deref().is_none_or(|p| {
                    p.exists_handler(&handler.id, handler.class_name.as_deref(), &handler.operations)
                })
            });
            if let Some(aspect) = selecting {
                handler.requires_proxy = true;
                proxied += 1;
                trace!(aspect = %aspect.rule.id, handler = %handler.id, "handler requires proxy");
            }
        }
        debug!(handlers = handlers.len(), proxied, "registered handler advice");
        proxied
    }

    /// Run both passes.
    pub fn wire(&self, resources: &mut [ResourceRule], handlers: &mut [HandlerRule]) -> WiringReport {
        let mut report = self.register_resources(resources);
        report.proxied_handlers = self.register_handlers(handlers);
        report
    }
}

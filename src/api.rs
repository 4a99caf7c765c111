use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aspect::{
    AdviceRuleRegistry, AdviceWiring, AspectDeclaration, AspectRule, HandlerDeclaration, HandlerRule,
    RelevantAdviceCache, ResourceDeclaration, ResourceRule, WiringReport,
};
use crate::error::{Result, RuleError};
use crate::pointcut::{PatternCache, PointcutType};

/// Options that affect how pointcut patterns are compiled.
///
/// Separators decide where a single `*` stops: resource names are paths,
/// handler ids are dotted, operation names are flat by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub resource_separator: Option<char>,
    pub handler_separator: Option<char>,
    pub operation_separator: Option<char>,
    /// Dialect for pointcuts that do not declare a `type`.
    pub default_pointcut_type: PointcutType,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            resource_separator: Some('/'),
            handler_separator: Some('.'),
            operation_separator: None,
            default_pointcut_type: PointcutType::Wildcard,
        }
    }
}

/// Everything an external loader hands over: options, aspects, and the
/// resources and handlers to wire them into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextDeclaration {
    pub options: Option<Options>,
    pub aspects: Vec<AspectDeclaration>,
    pub resources: Vec<ResourceDeclaration>,
    pub handlers: Vec<HandlerDeclaration>,
}

impl ContextDeclaration {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resource_rules(&self) -> Vec<ResourceRule> {
        self.resources.iter().map(ResourceRule::from).collect()
    }

    pub fn handler_rules(&self) -> Vec<HandlerRule> {
        self.handlers.iter().map(HandlerRule::from).collect()
    }
}

/// Compiled aspects plus the caches that serve them.
///
/// Each context owns its own pattern cache and relevant-advice cache; two
/// contexts never share state.
#[derive(Debug)]
pub struct AspectContext {
    options: Options,
    patterns: PatternCache,
    aspects: Vec<Arc<AspectRule>>,
    relevant: RelevantAdviceCache,
}

impl AspectContext {
    /// Compile every declared aspect. Fails on the first bad token, invalid
    /// regex or duplicate aspect id.
    pub fn build(declaration: &ContextDeclaration) -> Result<Self> {
        let options = declaration.options.clone().unwrap_or_default();
        let patterns = PatternCache::new();

        let mut seen = HashSet::new();
        let mut aspects = Vec::with_capacity(declaration.aspects.len());
        for decl in &declaration.aspects {
            if !seen.insert(decl.id.as_str()) {
                return Err(RuleError::DuplicateAspect(decl.id.clone()));
            }
            aspects.push(Arc::new(AspectRule::from_declaration(decl, &patterns, &options)?));
        }

        let relevant = RelevantAdviceCache::new(&aspects);
        debug!(
            aspects = aspects.len(),
            candidates = relevant.candidates().len(),
            patterns = patterns.len(),
            "built aspect context"
        );
        Ok(AspectContext { options, patterns, aspects, relevant })
    }

    /// Build from already constructed rules, for callers that assemble
    /// aspects programmatically. `patterns` should be the cache the rules'
    /// pointcuts were compiled through; the context takes it over.
    pub fn from_rules(options: Options, patterns: PatternCache, rules: Vec<AspectRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleError::DuplicateAspect(rule.id.clone()));
            }
        }
        let aspects: Vec<_> = rules.into_iter().map(Arc::new).collect();
        let relevant = RelevantAdviceCache::new(&aspects);
        Ok(AspectContext { options, patterns, aspects, relevant })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::build(&ContextDeclaration::from_json(json)?)
    }

    /// Advice that applies to a handler operation invoked under a resource.
    pub fn resolve(&self, resource: &str, handler: &str, operation: &str) -> Arc<AdviceRuleRegistry> {
        self.relevant.resolve(resource, handler, operation)
    }

    /// Attach resource-only aspects and flag handlers that need a proxy.
    pub fn wire(&self, resources: &mut [ResourceRule], handlers: &mut [HandlerRule]) -> WiringReport {
        AdviceWiring::new(&self.aspects).wire(resources, handlers)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn aspects(&self) -> &[Arc<AspectRule>] {
        &self.aspects
    }

    pub fn aspect(&self, id: &str) -> Option<&Arc<AspectRule>> {
        self.aspects.iter().find(|a| a.id == id)
    }

    pub fn pattern_cache(&self) -> &PatternCache {
        &self.patterns
    }

    pub fn relevant_cache(&self) -> &RelevantAdviceCache {
        &self.relevant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::{AdviceType, JoinpointScope};
    use crate::pointcut::{Pointcut, PointcutPatternRule};

    const RULES: &str = r#"{
        "aspects": [
            {
                "id": "audit",
                "joinpoint": { "pointcut": { "include": ["/orders/**@*Service^place*"] } },
                "settings": { "level": "info" },
                "advice": [
                    { "type": "before", "action": "audit.open" },
                    { "type": "after", "action": "audit.close" }
                ]
            },
            {
                "id": "timing",
                "joinpoint": { "scope": "request", "pointcut": { "include": ["/orders/**"] } },
                "advice": [{ "type": "around", "action": "timer.measure" }]
            },
            {
                "id": "errors",
                "joinpoint": { "target": "handler" },
                "advice": [{ "type": "thrown", "action": "errors.report" }]
            }
        ],
        "resources": [{ "name": "/orders/new" }, { "name": "/health" }],
        "handlers": [
            { "id": "orderService", "operations": ["placeOrder"] },
            { "id": "clock", "proxiable": false }
        ]
    }"#;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn context_is_shareable_across_threads() {
        assert_send_sync::<AspectContext>();
        assert_send_sync::<PatternCache>();
        assert_send_sync::<RelevantAdviceCache>();
    }

    #[test]
    fn resolve_tests_every_aspect() {
        let ctx = AspectContext::from_json(RULES).unwrap();
        assert_eq!(ctx.aspects().len(), 3);
        assert_eq!(ctx.relevant_cache().candidates().len(), 3);
        assert!(ctx.aspect("timing").is_some_and(|a| a.is_resource_only()));
        assert!(ctx.pattern_cache().len() >= 3);

        let registry = ctx.resolve("/orders/new", "orderService", "placeOrder");
        let before: Vec<_> = registry.before().iter().map(|a| a.action.as_str()).collect();
        assert_eq!(before, vec!["audit.open", "timer.measure"]);
        assert_eq!(registry.thrown()[0].advice_type, AdviceType::Thrown);
        assert_eq!(registry.setting("level"), Some(&serde_json::Value::from("info")));
        assert_eq!(registry.matched_aspect_count(), 3);

        let registry = ctx.resolve("/health", "orderService", "placeOrder");
        assert!(registry.before().is_empty());
        assert_eq!(registry.matched_aspect_count(), 1);
    }

    #[test]
    fn wire_attaches_scopes_and_flags_proxies() {
        let decl = ContextDeclaration::from_json(RULES).unwrap();
        let ctx = AspectContext::build(&decl).unwrap();
        let mut resources = decl.resource_rules();
        let mut handlers = decl.handler_rules();

        let report = ctx.wire(&mut resources, &mut handlers);

        let request = resources[0].registry(JoinpointScope::Request).unwrap();
        assert_eq!(request.before()[0].action, "timer.measure");
        assert_eq!(request.after()[0].action, "timer.measure");
        assert!(!resources[1].has_advice());
        assert!(handlers[0].requires_proxy);
        assert!(!handlers[1].requires_proxy);
        assert_eq!(report.wired_resources, 1);
        assert_eq!(report.proxied_handlers, 1);
    }

    #[test]
    fn options_are_read_from_the_declaration() {
        let json = r#"{
            "options": { "resource_separator": ".", "default_pointcut_type": "regexp" },
            "aspects": [{
                "id": "a",
                "joinpoint": { "pointcut": { "include": ["app\\.[a-z]+@.*"] } },
                "advice": [{ "type": "before", "action": "x" }]
            }]
        }"#;
        let ctx = AspectContext::from_json(json).unwrap();
        assert_eq!(ctx.options().resource_separator, Some('.'));
        assert_eq!(ctx.options().handler_separator, Some('.'));
        assert_eq!(ctx.resolve("app.orders", "svc", "op").before().len(), 1);
        assert!(ctx.resolve("app.Orders", "svc", "op").is_empty());
    }

    #[test]
    fn duplicate_aspect_ids_are_rejected() {
        let json = r#"{ "aspects": [{ "id": "a" }, { "id": "a" }] }"#;
        let err = AspectContext::from_json(json).unwrap_err();
        assert!(matches!(err, RuleError::DuplicateAspect(ref id) if id == "a"));

        let rules = vec![AspectRule::new("b"), AspectRule::new("b")];
        let err = AspectContext::from_rules(Options::default(), PatternCache::new(), rules).unwrap_err();
        assert!(matches!(err, RuleError::DuplicateAspect(_)));
    }

    #[test]
    fn from_rules_keeps_the_compiling_cache() {
        let options = Options::default();
        let patterns = PatternCache::new();
        let mut pointcut = Pointcut::new(PointcutType::Wildcard);
        pointcut.add_include(PointcutPatternRule::parse("/orders/**@*Service"), &patterns, &options).unwrap();
        let mut rule = AspectRule::new("svc");
        rule.pointcut = Some(Arc::new(pointcut));
        rule.add_advice(AdviceType::Before, "svc.enter");

        let compiled = patterns.len();
        assert!(compiled > 0);
        let ctx = AspectContext::from_rules(options, patterns, vec![rule]).unwrap();
        assert_eq!(ctx.pattern_cache().len(), compiled);
        assert_eq!(ctx.resolve("/orders/new", "orderService", "op").before()[0].action, "svc.enter");
    }

    #[test]
    fn bad_tokens_fail_the_build() {
        let json = r#"{ "aspects": [{ "id": "a", "joinpoint": { "scope": "session" } }] }"#;
        assert!(matches!(AspectContext::from_json(json), Err(RuleError::UnknownJoinpointScope(_))));

        let json = r#"{ "aspects": [{ "id": "a", "advice": [{ "type": "sometimes", "action": "x" }] }] }"#;
        assert!(matches!(AspectContext::from_json(json), Err(RuleError::UnknownAdviceType(_))));

        assert!(matches!(AspectContext::from_json("{ not json"), Err(RuleError::Json(_))));
    }

    #[test]
    fn contexts_do_not_share_caches() {
        let first = AspectContext::from_json(RULES).unwrap();
        let second = AspectContext::from_json(RULES).unwrap();
        first.resolve("/orders/new", "orderService", "placeOrder");
        assert_eq!(first.relevant_cache().len(), 1);
        assert!(second.relevant_cache().is_empty());
    }
}

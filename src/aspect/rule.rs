//! Aspect and advice rules, and the raw declarations they are built from.
//!
//! Declarations are plain `serde` records handed over by an external loader.
//! `AspectRule::from_declaration` validates every token (target, scope,
//! method types, advice types, pointcut type) and compiles the pointcut; any
//! unknown token is a build-time [`RuleError`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Options;
use crate::error::{Result, RuleError};
use crate::pointcut::{PatternCache, Pointcut, PointcutDeclaration};

/// Order of an aspect that does not declare one. Lower orders take precedence.
pub const DEFAULT_ORDER: i32 = i32::MAX;

// --- Tokens ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceType {
    Before,
    After,
    Around,
    Finally,
    /// Runs when the joinpoint raised an error.
    Thrown,
}

impl AdviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            AdviceType::Before => "before",
            AdviceType::After => "after",
            AdviceType::Around => "around",
            AdviceType::Finally => "finally",
            AdviceType::Thrown => "thrown",
        }
    }
}

impl FromStr for AdviceType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(AdviceType::Before),
            "after" => Ok(AdviceType::After),
            "around" => Ok(AdviceType::Around),
            "finally" => Ok(AdviceType::Finally),
            "thrown" | "exception" => Ok(AdviceType::Thrown),
            _ => Err(RuleError::UnknownAdviceType(s.to_string())),
        }
    }
}

/// What an aspect intercepts: whole resources, or individual handler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinpointTarget {
    #[default]
    Resource,
    Handler,
}

impl FromStr for JoinpointTarget {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resource" | "translet" => Ok(JoinpointTarget::Resource),
            "handler" | "method" => Ok(JoinpointTarget::Handler),
            _ => Err(RuleError::UnknownJoinpointTarget(s.to_string())),
        }
    }
}

/// Phase of resource processing an aspect attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinpointScope {
    #[default]
    Resource,
    Request,
    Content,
    Response,
}

impl JoinpointScope {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinpointScope::Resource => "resource",
            JoinpointScope::Request => "request",
            JoinpointScope::Content => "content",
            JoinpointScope::Response => "response",
        }
    }
}

impl FromStr for JoinpointScope {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resource" | "translet" => Ok(JoinpointScope::Resource),
            "request" => Ok(JoinpointScope::Request),
            "content" => Ok(JoinpointScope::Content),
            "response" => Ok(JoinpointScope::Response),
            _ => Err(RuleError::UnknownJoinpointScope(s.to_string())),
        }
    }
}

impl fmt::Display for JoinpointScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Request method filter carried on a joinpoint.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodTypes: u16 {
        const GET     = 1 << 0;
        const POST    = 1 << 1;
        const PUT     = 1 << 2;
        const PATCH   = 1 << 3;
        const DELETE  = 1 << 4;
        const HEAD    = 1 << 5;
        const OPTIONS = 1 << 6;
        const TRACE   = 1 << 7;
        const CONNECT = 1 << 8;
    }
}

impl MethodTypes {
    /// Parse a list such as `"GET, POST"` or `"get|head"`.
    pub fn parse_list(s: &str) -> Result<Self> {
        s.split(|c: char| c == ',' || c == '|' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .try_fold(MethodTypes::empty(), |acc, token| Ok(acc | token.parse::<MethodTypes>()?))
    }
}

impl FromStr for MethodTypes {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        MethodTypes::from_name(&s.trim().to_ascii_uppercase()).ok_or_else(|| RuleError::UnknownMethodType(s.to_string()))
    }
}

// --- Rules -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinpointRule {
    pub target: JoinpointTarget,
    pub scope: JoinpointScope,
    /// `None` means any method.
    pub methods: Option<MethodTypes>,
    pub headers: Vec<String>,
}

/// One piece of advice, tagged with its phase and owning aspect.
#[derive(Debug, Clone)]
pub struct AdviceRule {
    pub advice_type: AdviceType,
    pub aspect_id: String,
    pub aspect_order: i32,
    /// Name of the action to run; executed by the caller, never here.
    pub action: String,
    /// The owning aspect's pointcut.
    pub pointcut: Option<Arc<Pointcut>>,
}

impl PartialEq for AdviceRule {
    fn eq(&self, other: &Self) -> bool {
        self.advice_type == other.advice_type
            && self.aspect_id == other.aspect_id
            && self.aspect_order == other.aspect_order
            && self.action == other.action
    }
}

impl fmt::Display for AdviceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.aspect_id, self.advice_type.as_str(), self.action)
    }
}

#[derive(Debug, Clone)]
pub struct AspectRule {
    pub id: String,
    pub order: i32,
    pub joinpoint: JoinpointRule,
    /// `None` applies everywhere; an empty pointcut applies nowhere.
    pub pointcut: Option<Arc<Pointcut>>,
    pub settings: Map<String, Value>,
    /// Handler that implements the advice actions, if declared.
    pub advice_handler: Option<String>,
    pub advice: Vec<Arc<AdviceRule>>,
    pub description: Option<String>,
}

impl AspectRule {
    pub fn new(id: impl Into<String>) -> Self {
        AspectRule {
            id: id.into(),
            order: DEFAULT_ORDER,
            joinpoint: JoinpointRule::default(),
            pointcut: None,
            settings: Map::new(),
            advice_handler: None,
            advice: Vec::new(),
            description: None,
        }
    }

    /// Append advice owned by this aspect.
    pub fn add_advice(&mut self, advice_type: AdviceType, action: impl Into<String>) {
        self.advice.push(Arc::new(AdviceRule {
            advice_type,
            aspect_id: self.id.clone(),
            aspect_order: self.order,
            action: action.into(),
            pointcut: self.pointcut.clone(),
        }));
    }

    pub fn from_declaration(declaration: &AspectDeclaration, cache: &PatternCache, options: &Options) -> Result<Self> {
        let joinpoint = &declaration.joinpoint;
        let target = joinpoint.target.as_deref().map(str::parse::<JoinpointTarget>).transpose()?.unwrap_or_default();
        let scope = joinpoint.scope.as_deref().map(str::parse::<JoinpointScope>).transpose()?.unwrap_or_default();
        let methods = joinpoint.methods.as_deref().map(MethodTypes::parse_list).transpose()?;
        let pointcut = match &joinpoint.pointcut {
            Some(decl) => Some(Arc::new(Pointcut::compile(decl, cache, options)?)),
            None => None,
        };

        let mut rule = AspectRule::new(declaration.id.clone());
        rule.order = declaration.order.unwrap_or(DEFAULT_ORDER);
        rule.joinpoint = JoinpointRule { target, scope, methods, headers: joinpoint.headers.clone() };
        rule.pointcut = pointcut;
        rule.settings = declaration.settings.clone();
        rule.advice_handler = declaration.advice_handler.clone();
        rule.description = declaration.description.clone();
        for advice in &declaration.advice {
            rule.add_advice(advice.advice_type.parse::<AdviceType>()?, advice.action.clone());
        }
        Ok(rule)
    }

    /// A resource-level aspect whose pointcut constrains only resource names.
    ///
    /// Such aspects are attached to resources once, at wiring time, and never
    /// take part in per-joinpoint resolution.
    pub fn is_resource_only(&self) -> bool {
        self.joinpoint.target == JoinpointTarget::Resource
            && self.pointcut.as_deref().is_none_or(|p| !p.references_handlers())
    }
}

impl fmt::Display for AspectRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aspect '{}'", self.id)?;
        if self.order != DEFAULT_ORDER {
            write!(f, " (order {})", self.order)?;
        }
        Ok(())
    }
}

// --- Declarations ------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinpointDeclaration {
    pub target: Option<String>,
    pub scope: Option<String>,
    pub methods: Option<String>,
    pub headers: Vec<String>,
    pub pointcut: Option<PointcutDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceDeclaration {
    #[serde(rename = "type")]
    pub advice_type: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectDeclaration {
    pub id: String,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub joinpoint: JoinpointDeclaration,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub advice_handler: Option<String>,
    #[serde(default)]
    pub advice: Vec<AdviceDeclaration>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tokens_case_insensitively() {
        assert_eq!("Translet".parse::<JoinpointScope>().unwrap(), JoinpointScope::Resource);
        assert_eq!("RESPONSE".parse::<JoinpointScope>().unwrap(), JoinpointScope::Response);
        assert_eq!("method".parse::<JoinpointTarget>().unwrap(), JoinpointTarget::Handler);
        assert_eq!("exception".parse::<AdviceType>().unwrap(), AdviceType::Thrown);
    }

    #[test]
    fn unknown_tokens_name_the_offender() {
        assert!(matches!("session".parse::<JoinpointScope>(), Err(RuleError::UnknownJoinpointScope(t)) if t == "session"));
        assert!(matches!("bean".parse::<JoinpointTarget>(), Err(RuleError::UnknownJoinpointTarget(t)) if t == "bean"));
        assert!(matches!("during".parse::<AdviceType>(), Err(RuleError::UnknownAdviceType(t)) if t == "during"));
    }

    #[test]
    fn method_lists_accept_mixed_separators() {
        let methods = MethodTypes::parse_list("get, POST|head").unwrap();
        assert_eq!(methods, MethodTypes::GET | MethodTypes::POST | MethodTypes::HEAD);
        assert!(matches!(MethodTypes::parse_list("GET, FETCH"), Err(RuleError::UnknownMethodType(t)) if t == "FETCH"));
    }

    #[test]
    fn advice_inherits_aspect_identity() {
        let mut aspect = AspectRule::new("audit");
        aspect.order = 3;
        aspect.add_advice(AdviceType::Before, "log");
        assert_eq!(aspect.advice[0].aspect_id, "audit");
        assert_eq!(aspect.advice[0].aspect_order, 3);
        assert_eq!(aspect.advice[0].to_string(), "audit:before:log");
    }

    #[test]
    fn resource_only_requires_resource_target_and_name_only_pointcut() {
        let cache = PatternCache::new();
        let options = Options::default();
        let build = |json: &str| {
            let decl: AspectDeclaration = serde_json::from_str(json).unwrap();
            AspectRule::from_declaration(&decl, &cache, &options).unwrap()
        };

        assert!(build(r#"{"id": "a"}"#).is_resource_only());
        assert!(build(r#"{"id": "a", "joinpoint": {"pointcut": {"include": ["/x/**"]}}}"#).is_resource_only());
        assert!(!build(r#"{"id": "a", "joinpoint": {"pointcut": {"include": ["/x/**@svc"]}}}"#).is_resource_only());
        assert!(!build(r#"{"id": "a", "joinpoint": {"target": "handler"}}"#).is_resource_only());
    }

    #[test]
    fn from_declaration_rejects_bad_method_types() {
        let decl: AspectDeclaration =
            serde_json::from_str(r#"{"id": "a", "joinpoint": {"methods": "GET, BREW"}}"#).unwrap();
        let err = AspectRule::from_declaration(&decl, &PatternCache::new(), &Options::default()).unwrap_err();
        assert!(matches!(err, RuleError::UnknownMethodType(t) if t == "BREW"));
    }
}

//! Pointcuts: include/exclude pattern sets over (resource, handler, operation).
//!
//! ```text
//! PointcutDeclaration { type, include: [..], exclude: [..] }
//!          │  Pointcut::compile (patterns interned in PatternCache)
//!          v
//! Pointcut { include_list, exclude_list }
//!          │
//!          ├─ matches(resource)
//!          ├─ matches_handler(resource, handler)
//!          └─ matches_operation(resource, handler, operation)
//!
//!   1. any exclude pattern matches  -> false
//!   2. any include pattern matches  -> true
//!   3. otherwise                    -> false
//! ```
//!
//! ## Invariants
//!
//! - Exclusion always wins over inclusion.
//! - An empty `Pointcut` matches nothing. An absent pointcut (`None` at the call
//!   site, see [`applies`]) matches everything; the two are never conflated.
//! - Both dialects (wildcard and regexp) share the evaluation above; only the
//!   component compilation differs.
//!
//! ## Design notes
//!
//! - Pattern components that are present require the corresponding name to be
//!   supplied: `matches("/a")` never matches a pattern with a handler component.
//! - `exists_handler` is a separate, lenient query for build-time proxy
//!   decisions, where only a handler id and its operation names are known.

#[path = "pointcut/cache.rs"]
mod cache;
#[path = "pointcut/pattern.rs"]
mod pattern;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Options;
use crate::error::{Result, RuleError};

pub use cache::PatternCache;
#[allow(unused_imports)]
pub use pattern::{
    CLASS_DIRECTIVE_PREFIX, HANDLER_DELIMITER, NamePattern, OPERATION_DELIMITER, PatternKind, PointcutPattern,
    PointcutPatternRule,
};

// --- Pointcut type -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointcutType {
    #[default]
    Wildcard,
    Regexp,
}

impl PointcutType {
    pub fn as_str(self) -> &'static str {
        match self {
            PointcutType::Wildcard => "wildcard",
            PointcutType::Regexp => "regexp",
        }
    }
}

impl FromStr for PointcutType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wildcard" => Ok(PointcutType::Wildcard),
            "regexp" | "regex" => Ok(PointcutType::Regexp),
            _ => Err(RuleError::UnknownPointcutType(s.to_string())),
        }
    }
}

impl fmt::Display for PointcutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Declarations ------------------------------------------------------------

/// One pattern as declared: either a combined `resource@handler^operation`
/// string or the components spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternDeclaration {
    Combined(String),
    Parts {
        #[serde(default, alias = "translet")]
        resource: Option<String>,
        #[serde(default, alias = "bean")]
        handler: Option<String>,
        #[serde(default, alias = "method")]
        operation: Option<String>,
    },
}

impl PatternDeclaration {
    pub fn to_rule(&self) -> PointcutPatternRule {
        match self {
            PatternDeclaration::Combined(s) => PointcutPatternRule::parse(s),
            PatternDeclaration::Parts { resource, handler, operation } => {
                PointcutPatternRule::new(resource.as_deref(), handler.as_deref(), operation.as_deref())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointcutDeclaration {
    /// `wildcard` or `regexp`; falls back to `Options::default_pointcut_type`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub pointcut_type: Option<String>,
    pub include: Vec<PatternDeclaration>,
    pub exclude: Vec<PatternDeclaration>,
}

// --- Pointcut ----------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Pointcut {
    pointcut_type: PointcutType,
    include_list: Vec<PointcutPattern>,
    exclude_list: Vec<PointcutPattern>,
}

impl Pointcut {
    /// An empty pointcut of the given dialect. Matches nothing until patterns
    /// are added.
    pub fn new(pointcut_type: PointcutType) -> Self {
        Pointcut { pointcut_type, include_list: Vec::new(), exclude_list: Vec::new() }
    }

    pub fn compile(declaration: &PointcutDeclaration, cache: &PatternCache, options: &Options) -> Result<Self> {
        let pointcut_type = match &declaration.pointcut_type {
            Some(token) => token.parse()?,
            None => options.default_pointcut_type,
        };
        let mut pointcut = Pointcut::new(pointcut_type);
        for decl in &declaration.include {
            pointcut.add_include(decl.to_rule(), cache, options)?;
        }
        for decl in &declaration.exclude {
            pointcut.add_exclude(decl.to_rule(), cache, options)?;
        }
        Ok(pointcut)
    }

    pub fn add_include(&mut self, rule: PointcutPatternRule, cache: &PatternCache, options: &Options) -> Result<()> {
        let pattern = PointcutPattern::compile(PatternKind::Include, rule, self.pointcut_type, cache, options)?;
        self.include_list.push(pattern);
        Ok(())
    }

    pub fn add_exclude(&mut self, rule: PointcutPatternRule, cache: &PatternCache, options: &Options) -> Result<()> {
        let pattern = PointcutPattern::compile(PatternKind::Exclude, rule, self.pointcut_type, cache, options)?;
        self.exclude_list.push(pattern);
        Ok(())
    }

    pub fn pointcut_type(&self) -> PointcutType {
        self.pointcut_type
    }

    pub fn include_list(&self) -> &[PointcutPattern] {
        &self.include_list
    }

    pub fn exclude_list(&self) -> &[PointcutPattern] {
        &self.exclude_list
    }

    pub fn is_empty(&self) -> bool {
        self.include_list.is_empty() && self.exclude_list.is_empty()
    }

    pub fn matches(&self, resource: &str) -> bool {
        self.matches_names(Some(resource), None, None)
    }

    pub fn matches_handler(&self, resource: &str, handler: &str) -> bool {
        self.matches_names(Some(resource), Some(handler), None)
    }

    pub fn matches_operation(&self, resource: &str, handler: &str, operation: &str) -> bool {
        self.matches_names(Some(resource), Some(handler), Some(operation))
    }

    /// Evaluate with any subset of names supplied.
    pub fn matches_names(&self, resource: Option<&str>, handler: Option<&str>, operation: Option<&str>) -> bool {
        if self.exclude_list.iter().any(|p| p.matches(resource, handler, operation)) {
            return false;
        }
        self.include_list.iter().any(|p| p.matches(resource, handler, operation))
    }

    /// Whether some include pattern could select the handler `handler_id`
    /// (optionally of class `class_name`) through one of its `operations`.
    pub fn exists_handler(&self, handler_id: &str, class_name: Option<&str>, operations: &[String]) -> bool {
        self.include_list.iter().any(|p| p.exists_handler(handler_id, class_name, operations))
    }

    /// Whether any pattern, include or exclude, constrains a handler, class or
    /// operation.
    pub fn references_handlers(&self) -> bool {
        self.include_list.iter().chain(&self.exclude_list).any(|p| p.rule().references_handlers())
    }
}

/// Evaluate an optional pointcut: `None` means "applies everywhere".
pub fn applies(pointcut: Option<&Pointcut>, resource: &str, handler: &str, operation: &str) -> bool {
    pointcut.is_none_or(|p| p.matches_operation(resource, handler, operation))
}

#[cfg(test)]
#[path = "pointcut/tests.rs"]
mod tests;

//! Pointcut patterns: one include or exclude rule over up to three names.
//!
//! A pattern string packs the components with two delimiters:
//!
//! ```text
//! "/service/**@userService^get*"
//!   └ resource ┘ └ handler ┘ └ operation
//!
//! "/service/*"            resource only (no '@')
//! "@*Service"             handler only
//! "@^get*"                operation only
//! "@class:com.example.*"  handler class instead of handler id
//! ```
//!
//! Parsing is lenient: a string without `@` is entirely a resource pattern, even
//! when it contains `^`. Empty components are absent.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{PatternCache, PointcutType};
use crate::Options;
use crate::error::Result;
use crate::wildcard::WildcardPattern;

pub const HANDLER_DELIMITER: char = '@';
pub const OPERATION_DELIMITER: char = '^';
pub const CLASS_DIRECTIVE_PREFIX: &str = "class:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    #[default]
    Include,
    Exclude,
}

/// Raw, uncompiled components of one pointcut pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointcutPatternRule {
    pub resource: Option<String>,
    pub handler: Option<String>,
    pub class_name: Option<String>,
    pub operation: Option<String>,
}

impl PointcutPatternRule {
    /// Split a `resource@handler^operation` string.
    pub fn parse(pattern: &str) -> Self {
        let (resource, handler_part) = match pattern.find(HANDLER_DELIMITER) {
            None => (Some(pattern), None),
            Some(0) => (None, Some(&pattern[1..])),
            Some(idx) => (Some(&pattern[..idx]), Some(&pattern[idx + 1..])),
        };

        let (handler, operation) = match handler_part {
            None => (None, None),
            Some(part) => match part.find(OPERATION_DELIMITER) {
                None => (Some(part), None),
                Some(0) => (None, Some(&part[1..])),
                Some(idx) => (Some(&part[..idx]), Some(&part[idx + 1..])),
            },
        };

        Self::new(resource, handler, operation)
    }

    /// Build from separate components. A handler starting with `class:` names
    /// the handler's class instead of its id.
    pub fn new(resource: Option<&str>, handler: Option<&str>, operation: Option<&str>) -> Self {
        let (handler, class_name) = match handler.map(|h| h.strip_prefix(CLASS_DIRECTIVE_PREFIX).ok_or(h)) {
            Some(Ok(class_name)) => (None, non_empty(Some(class_name))),
            Some(Err(handler)) => (non_empty(Some(handler)), None),
            None => (None, None),
        };
        PointcutPatternRule { resource: non_empty(resource), handler, class_name, operation: non_empty(operation) }
    }

    /// Inverse of [`PointcutPatternRule::parse`].
    pub fn combine(&self) -> String {
        let mut out = String::new();
        if let Some(resource) = &self.resource {
            out.push_str(resource);
        }
        if let Some(handler) = &self.handler {
            out.push(HANDLER_DELIMITER);
            out.push_str(handler);
        } else if let Some(class_name) = &self.class_name {
            out.push(HANDLER_DELIMITER);
            out.push_str(CLASS_DIRECTIVE_PREFIX);
            out.push_str(class_name);
        }
        if let Some(operation) = &self.operation {
            if self.handler.is_none() && self.class_name.is_none() {
                out.push(HANDLER_DELIMITER);
            }
            out.push(OPERATION_DELIMITER);
            out.push_str(operation);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_none() && self.handler.is_none() && self.class_name.is_none() && self.operation.is_none()
    }

    /// Whether this rule constrains anything beyond the resource name.
    pub fn references_handlers(&self) -> bool {
        self.handler.is_some() || self.class_name.is_some() || self.operation.is_some()
    }
}

impl fmt::Display for PointcutPatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.combine())
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

// --- Compiled patterns -------------------------------------------------------

/// One compiled name component, in either dialect.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Wildcard(Arc<WildcardPattern>),
    Regex(Arc<Regex>),
}

impl NamePattern {
    fn compile(
        pointcut_type: PointcutType,
        pattern: &str,
        separator: Option<char>,
        cache: &PatternCache,
    ) -> Result<Self> {
        Ok(match pointcut_type {
            PointcutType::Wildcard => NamePattern::Wildcard(cache.wildcard(pattern, separator)),
            PointcutType::Regexp => NamePattern::Regex(cache.regex(pattern)?),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Wildcard(p) => p.matches(name),
            NamePattern::Regex(re) => re.is_match(name),
        }
    }
}

/// A compiled include or exclude pattern.
#[derive(Debug, Clone)]
pub struct PointcutPattern {
    kind: PatternKind,
    rule: PointcutPatternRule,
    resource: Option<NamePattern>,
    handler: Option<NamePattern>,
    class_name: Option<NamePattern>,
    operation: Option<NamePattern>,
}

impl PointcutPattern {
    pub(crate) fn compile(
        kind: PatternKind,
        rule: PointcutPatternRule,
        pointcut_type: PointcutType,
        cache: &PatternCache,
        options: &Options,
    ) -> Result<Self> {
        let component = |pattern: &Option<String>, separator: Option<char>| -> Result<Option<NamePattern>> {
            pattern.as_deref().map(|p| NamePattern::compile(pointcut_type, p, separator, cache)).transpose()
        };

        Ok(PointcutPattern {
            kind,
            resource: component(&rule.resource, options.resource_separator)?,
            handler: component(&rule.handler, options.handler_separator)?,
            class_name: component(&rule.class_name, options.handler_separator)?,
            operation: component(&rule.operation, options.operation_separator)?,
            rule,
        })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn rule(&self) -> &PointcutPatternRule {
        &self.rule
    }

    /// Strict match: an absent pattern component is "don't care", a present
    /// component requires the corresponding name to be supplied and to match.
    ///
    /// A joinpoint carries no class name, so a pattern with a class component
    /// never matches here; it only takes part in
    /// [`PointcutPattern::exists_handler`].
    pub fn matches(&self, resource: Option<&str>, handler: Option<&str>, operation: Option<&str>) -> bool {
        strict(&self.resource, resource)
            && strict(&self.handler, handler)
            && strict(&self.class_name, None)
            && strict(&self.operation, operation)
    }

    /// Lenient check used when deciding whether a handler needs interception:
    /// the resource component is ignored, a missing class name is "don't care",
    /// and the operation component matches if any of `operations` does, so a
    /// handler that lists no operations never satisfies one.
    pub fn exists_handler(&self, handler_id: &str, class_name: Option<&str>, operations: &[String]) -> bool {
        if let Some(p) = &self.handler {
            if !p.matches(handler_id) {
                return false;
            }
        }
        if let (Some(p), Some(class_name)) = (&self.class_name, class_name) {
            if !p.matches(class_name) {
                return false;
            }
        }
        match &self.operation {
            Some(p) => operations.iter().any(|op| p.matches(op)),
            None => true,
        }
    }
}

fn strict(pattern: &Option<NamePattern>, name: Option<&str>) -> bool {
    match (pattern, name) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(p), Some(name)) => p.matches(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_three_components() {
        let rule = PointcutPatternRule::parse("/service/**@userService^get*");
        assert_eq!(rule.resource.as_deref(), Some("/service/**"));
        assert_eq!(rule.handler.as_deref(), Some("userService"));
        assert_eq!(rule.operation.as_deref(), Some("get*"));
    }

    #[test]
    fn string_without_handler_delimiter_is_all_resource() {
        let rule = PointcutPatternRule::parse("/a^b");
        assert_eq!(rule, PointcutPatternRule { resource: Some("/a^b".into()), ..Default::default() });
    }

    #[test]
    fn leading_delimiters_drop_components() {
        let rule = PointcutPatternRule::parse("@*Service");
        assert_eq!(rule.resource, None);
        assert_eq!(rule.handler.as_deref(), Some("*Service"));

        let rule = PointcutPatternRule::parse("@^execute");
        assert_eq!(rule.handler, None);
        assert_eq!(rule.operation.as_deref(), Some("execute"));
    }

    #[test]
    fn empty_components_are_absent() {
        let rule = PointcutPatternRule::parse("/a@^");
        assert_eq!(rule, PointcutPatternRule { resource: Some("/a".into()), ..Default::default() });
        assert!(PointcutPatternRule::parse("").is_empty());
    }

    #[test]
    fn class_directive_targets_class_name() {
        let rule = PointcutPatternRule::parse("@class:com.example.*Dao^find*");
        assert_eq!(rule.handler, None);
        assert_eq!(rule.class_name.as_deref(), Some("com.example.*Dao"));
        assert_eq!(rule.operation.as_deref(), Some("find*"));
        assert!(rule.references_handlers());
    }

    #[test]
    fn combine_inverts_parse() {
        for s in ["/a/*", "/a@b", "/a@b^c", "@b", "@^c", "@class:x.Y^z", "/a@^c"] {
            assert_eq!(PointcutPatternRule::parse(s).combine(), s);
        }
    }

    #[test]
    fn resource_only_rule_references_no_handlers() {
        assert!(!PointcutPatternRule::parse("/a/**").references_handlers());
        assert!(PointcutPatternRule::parse("/a/**@svc").references_handlers());
    }
}

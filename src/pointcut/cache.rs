//! Shared memo of compiled name patterns.
//!
//! Many pointcuts repeat the same component patterns (`"*"`, `"get*"`,
//! `"/service/**"`), so compiled forms are interned per owning context. The
//! cache hands out `Arc`s; entries are never evicted.
//!
//! ## Invariants
//!
//! - A (pattern, separator) pair is compiled at most once per cache: the
//!   compile step runs while the map entry is held.
//! - Regex entries are full-match anchored (`^(?:...)$`).

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use regex::Regex;

use crate::error::{Result, RuleError};
use crate::wildcard::WildcardPattern;

#[derive(Debug, Default)]
pub struct PatternCache {
    wildcards: DashMap<(String, Option<char>), Arc<WildcardPattern>>,
    regexes: DashMap<String, Arc<Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled wildcard for `pattern`, compiling it on first use.
    pub fn wildcard(&self, pattern: &str, separator: Option<char>) -> Arc<WildcardPattern> {
        let key = (pattern.to_string(), separator);
        if let Some(hit) = self.wildcards.get(&key) {
            return Arc::clone(hit.value());
        }
        let entry = self.wildcards.entry(key).or_insert_with(|| Arc::new(WildcardPattern::compile(pattern, separator)));
        Arc::clone(entry.value())
    }

    /// The compiled, fully anchored regex for `pattern`.
    pub fn regex(&self, pattern: &str) -> Result<Arc<Regex>> {
        if let Some(hit) = self.regexes.get(pattern) {
            return Ok(Arc::clone(hit.value()));
        }
        match self.regexes.entry(pattern.to_string()) {
            Entry::Occupied(e) => Ok(Arc::clone(e.get())),
            Entry::Vacant(v) => {
                let re = Regex::new(&format!("^(?:{pattern})$"))
                    .map_err(|source| RuleError::InvalidRegex { pattern: pattern.to_string(), source })?;
                Ok(Arc::clone(v.insert(Arc::new(re)).value()))
            }
        }
    }

    /// Number of distinct compiled patterns, both dialects.
    pub fn len(&self) -> usize {
        self.wildcards.len() + self.regexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_pattern_and_separator_share_one_compilation() {
        let cache = PatternCache::new();
        let a = cache.wildcard("/a/*", Some('/'));
        let b = cache.wildcard("/a/*", Some('/'));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn separator_is_part_of_the_key() {
        let cache = PatternCache::new();
        let slash = cache.wildcard("a.*", Some('/'));
        let dot = cache.wildcard("a.*", Some('.'));
        assert!(!Arc::ptr_eq(&slash, &dot));
        assert!(slash.matches("a.b.c"));
        assert!(!dot.matches("a.b.c"));
    }

    #[test]
    fn regex_is_anchored_and_cached() {
        let cache = PatternCache::new();
        let re = cache.regex("get[A-Z].*").unwrap();
        assert!(re.is_match("getUser"));
        assert!(!re.is_match("xgetUser"));
        assert!(Arc::ptr_eq(&re, &cache.regex("get[A-Z].*").unwrap()));
    }

    #[test]
    fn invalid_regex_reports_pattern() {
        let cache = PatternCache::new();
        let err = cache.regex("get(").unwrap_err();
        assert!(matches!(err, RuleError::InvalidRegex { ref pattern, .. } if pattern == "get("));
        assert!(cache.is_empty());
    }
}

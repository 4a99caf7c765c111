//! Wildcard patterns for hierarchical names.
//!
//! This module owns the small, fixed wildcard dialect used by pointcuts to
//! select resources, handlers and operations:
//!
//! ```text
//! "/service/**"   "com.example.*Service"   "get*"
//!      │                   │                 │
//!      └── WildcardPattern::compile(pattern, separator)   (pattern.rs)
//!                          │
//!            ┌─────────────┴──────────────┐
//!            v                            v
//!   WildcardPattern::matches      WildcardMatcher          (matcher.rs)
//!   WildcardPattern::mask          - groups between separators
//!      (engine.rs)                 - cursor navigation
//! ```
//!
//! ## Responsibilities by module
//!
//! - `pattern.rs`: compiles a pattern string into a token/type list.
//! - `engine.rs`: the two-cursor matcher with bounded star backtracking, and
//!   masking (extract what the wildcards consumed).
//! - `matcher.rs`: a stateful wrapper that remembers separator-delimited groups
//!   of the last input.
//!
//! ## Invariants
//!
//! - Compilation never fails.
//! - A compiled pattern is immutable; share it with `Arc` rather than recompiling.
//!   `pointcut::PatternCache` does this per (pattern, separator).

#[path = "wildcard/engine.rs"]
mod engine;
#[path = "wildcard/matcher.rs"]
mod matcher;
#[path = "wildcard/pattern.rs"]
mod pattern;

#[allow(unused_imports)]
pub use matcher::WildcardMatcher;
#[allow(unused_imports)]
pub use pattern::{PLUS_CHAR, QUESTION_CHAR, STAR_CHAR, TokenType, WildcardPattern};

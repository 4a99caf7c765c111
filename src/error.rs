//! Build-time configuration errors.
//!
//! Every error here is raised while turning declarations into rules. Matching
//! and advice resolution never fail: an unmatched name is `false` or an empty
//! registry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unknown joinpoint scope '{0}' (expected one of: resource, request, content, response)")]
    UnknownJoinpointScope(String),

    #[error("unknown joinpoint target '{0}' (expected one of: resource, handler)")]
    UnknownJoinpointTarget(String),

    #[error("unknown method type '{0}'")]
    UnknownMethodType(String),

    #[error("unknown pointcut type '{0}' (expected one of: wildcard, regexp)")]
    UnknownPointcutType(String),

    #[error("unknown advice type '{0}' (expected one of: before, after, around, finally, thrown)")]
    UnknownAdviceType(String),

    #[error("invalid regular expression '{pattern}'")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("aspect '{0}' is declared more than once")]
    DuplicateAspect(String),

    #[error("failed to decode declarations")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = RuleError> = std::result::Result<T, E>;

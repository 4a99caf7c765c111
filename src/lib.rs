#[macro_use]
mod macros;
mod api;
pub mod aspect;
mod error;
pub mod pointcut;
pub mod wildcard;

pub use api::{AspectContext, ContextDeclaration, Options};
pub use error::{Result, RuleError};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}

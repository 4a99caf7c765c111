/// A compiled `WildcardPattern` for a literal pattern, built once on first use.
///
/// `wildcard!("/api/**", '/')` for a separated pattern, `wildcard!("get*")`
/// for one without a separator.
#[macro_export]
macro_rules! wildcard {
    ($pat:literal) => {{
        static PATTERN: $crate::__private::Lazy<$crate::wildcard::WildcardPattern> =
            $crate::__private::Lazy::new(|| $crate::wildcard::WildcardPattern::compile($pat, None));
        &*PATTERN
    }};
    ($pat:literal, $sep:literal) => {{
        static PATTERN: $crate::__private::Lazy<$crate::wildcard::WildcardPattern> =
            $crate::__private::Lazy::new(|| $crate::wildcard::WildcardPattern::compile($pat, Some($sep)));
        &*PATTERN
    }};
}

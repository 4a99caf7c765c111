//! Wildcard pattern compilation.
//!
//! A pattern string is compiled once into a flat token list: one entry per
//! pattern character, each tagged with a [`TokenType`]. The matcher in
//! `engine.rs` walks this list; nothing here allocates per match.
//!
//! ```text
//! "/a/*.jpg"  separator '/'
//!
//!  tokens: [ '/', 'a', '/', '*', '.', 'j', 'p', 'g', END ]
//!  types:  [ SEP, LIT, SEP, STAR, LIT, LIT, LIT, LIT, END ]
//!
//! "/static/**"
//!
//!  tokens: [ '/', 's', ..., 'c', '/', '*', END ]
//!  types:  [ SEP, LIT, ..., LIT, SEP, STAR_STAR, END ]
//! ```
//!
//! ## Grammar
//!
//! Exactly five metacharacters are recognised; everything else is a literal:
//!
//! - `*`  zero or more characters inside one segment
//! - `**` zero or more characters across segments (any run of two or more `*`)
//! - `?`  one character that is not the separator (may match empty at the end)
//! - `+`  one character that is not the separator
//! - the separator character itself, when one is configured
//!
//! Compilation never fails: every string is a valid pattern.
//!
//! ## Invariants
//!
//! - `tokens.len() == types.len()`.
//! - The last entry is always `TokenType::End` and it is the only `End`.

use std::fmt;

pub const STAR_CHAR: char = '*';
pub const QUESTION_CHAR: char = '?';
pub const PLUS_CHAR: char = '+';

/// Type tag of a compiled token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Literal,
    Star,
    StarStar,
    Question,
    Plus,
    Separator,
    End,
}

impl TokenType {
    /// Whether a trailing token of this type can match the empty string.
    pub(crate) fn can_match_empty(self) -> bool {
        matches!(self, TokenType::Star | TokenType::StarStar | TokenType::Question | TokenType::End)
    }

    pub(crate) fn is_star(self) -> bool {
        matches!(self, TokenType::Star | TokenType::StarStar)
    }

    pub(crate) fn is_wildcard(self) -> bool {
        matches!(self, TokenType::Star | TokenType::StarStar | TokenType::Question | TokenType::Plus)
    }
}

/// A compiled wildcard pattern.
///
/// Immutable after construction and cheap to share behind an `Arc`; see
/// `pointcut::PatternCache` for the memoizing owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardPattern {
    pattern: String,
    separator: Option<char>,
    tokens: Vec<char>,
    types: Vec<TokenType>,
}

impl WildcardPattern {
    /// Compile `pattern` without a separator (non-hierarchical matching).
    pub fn new(pattern: &str) -> Self {
        Self::compile(pattern, None)
    }

    /// Compile `pattern` with an optional segment `separator`.
    pub fn compile(pattern: &str, separator: Option<char>) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len() + 1);
        let mut types = Vec::with_capacity(pattern.len() + 1);

        for c in pattern.chars() {
            if c == STAR_CHAR {
                match types.last_mut() {
                    // `**`, `***`, ... all fold into one cross-segment star.
                    Some(last @ (TokenType::Star | TokenType::StarStar)) => *last = TokenType::StarStar,
                    _ => {
                        tokens.push(c);
                        types.push(TokenType::Star);
                    }
                }
                continue;
            }

            let ty = if Some(c) == separator {
                TokenType::Separator
            } else if c == QUESTION_CHAR {
                TokenType::Question
            } else if c == PLUS_CHAR {
                TokenType::Plus
            } else {
                TokenType::Literal
            };
            tokens.push(c);
            types.push(ty);
        }

        tokens.push(' ');
        types.push(TokenType::End);

        WildcardPattern { pattern: pattern.to_string(), separator, tokens, types }
    }

    /// The original pattern string.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn separator(&self) -> Option<char> {
        self.separator
    }

    pub(crate) fn tokens(&self) -> &[char] {
        &self.tokens
    }

    pub(crate) fn types(&self) -> &[TokenType] {
        &self.types
    }

    /// Iterate `(token, type)` pairs, including the trailing `End`.
    pub fn token_pairs(&self) -> impl Iterator<Item = (char, TokenType)> + '_ {
        self.tokens.iter().copied().zip(self.types.iter().copied())
    }

    /// True when the pattern contains no wildcard tokens, so it can only ever
    /// match its own text.
    pub fn is_literal(&self) -> bool {
        !self.types.iter().any(|t| t.is_wildcard())
    }

    /// Test `input` against this pattern.
    pub fn matches(&self, input: &str) -> bool {
        if self.is_literal() {
            return self.pattern == input;
        }
        super::engine::matches(self, input)
    }

    /// Keep only the characters consumed by wildcard tokens.
    ///
    /// See `engine::mask` for the exact rules.
    pub fn mask(&self, input: &str) -> Option<String> {
        super::engine::mask(self, input)
    }

    /// Whether `s` contains any of the wildcard metacharacters `*`, `?`, `+`.
    pub fn has_wildcards(s: &str) -> bool {
        s.chars().any(|c| c == STAR_CHAR || c == QUESTION_CHAR || c == PLUS_CHAR)
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types_of(p: &WildcardPattern) -> Vec<TokenType> {
        p.token_pairs().map(|(_, t)| t).collect()
    }

    #[test]
    fn compiles_separator_and_literals() {
        let p = WildcardPattern::compile("/a/*", Some('/'));
        assert_eq!(
            types_of(&p),
            vec![TokenType::Separator, TokenType::Literal, TokenType::Separator, TokenType::Star, TokenType::End]
        );
    }

    #[test]
    fn star_runs_fold_into_star_star() {
        let p = WildcardPattern::compile("a/***/b", Some('/'));
        assert_eq!(
            types_of(&p),
            vec![
                TokenType::Literal,
                TokenType::Separator,
                TokenType::StarStar,
                TokenType::Separator,
                TokenType::Literal,
                TokenType::End
            ]
        );
    }

    #[test]
    fn question_and_plus_are_distinct_tokens() {
        let p = WildcardPattern::new("a?+");
        assert_eq!(types_of(&p), vec![TokenType::Literal, TokenType::Question, TokenType::Plus, TokenType::End]);
    }

    #[test]
    fn separator_is_literal_when_not_configured() {
        let p = WildcardPattern::new("/a");
        assert_eq!(types_of(&p), vec![TokenType::Literal, TokenType::Literal, TokenType::End]);
        assert!(p.is_literal());
    }

    #[test]
    fn exactly_one_end_token() {
        for s in ["", "*", "**", "a/b", "?+*"] {
            let p = WildcardPattern::compile(s, Some('/'));
            assert_eq!(p.types().iter().filter(|t| **t == TokenType::End).count(), 1);
            assert_eq!(p.types().last(), Some(&TokenType::End));
        }
    }

    #[test]
    fn detects_wildcards() {
        assert!(WildcardPattern::has_wildcards("/a/*"));
        assert!(WildcardPattern::has_wildcards("a+"));
        assert!(!WildcardPattern::has_wildcards("/a/b"));
    }
}

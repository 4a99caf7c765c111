//! Wildcard matching and masking.
//!
//! The matcher is a single left-to-right scan with two cursors:
//!
//! ```text
//! pattern: [ '/', 'a', '/', STAR_STAR, '/', 'x', END ]
//!             ^ ti
//! input:   "/a/b/c/x"
//!             ^ ci
//! ```
//!
//! Deterministic tokens (`Literal`, `Separator`, `?`, `+`) advance both cursors
//! or fail. Star tokens first try to match empty (advance `ti` only) and leave a
//! choice point behind; on failure the most recent choice point is resumed by
//! letting that star swallow one more character. `*` refuses to swallow the
//! separator, `**` does not.
//!
//! ## Bounding the backtracking
//!
//! Every transition strictly increases `ti + ci`, so a star state `(ti, ci)` is
//! never its own ancestor. When the search reaches a star state it has already
//! entered, the earlier visit finished without success, and the state can fail
//! immediately. Star states are therefore expanded at most once, which keeps the
//! work proportional to `tokens * input` rather than exponential.
//!
//! ## Trailing tokens and trailing input
//!
//! - Once the input is exhausted, the remaining tokens must all be able to match
//!   empty (`*`, `**`, `?`, `END`). A leftover literal, `+` or separator fails.
//! - Leftover input when the pattern reaches `END` always fails.

use super::pattern::{TokenType, WildcardPattern};

/// Match `input` against `pattern`.
pub(crate) fn matches(pattern: &WildcardPattern, input: &str) -> bool {
    let chars: Vec<char> = input.chars().collect();
    trace(pattern, &chars).is_some()
}

/// Run the matcher and report, for every input character, the index of the
/// token that consumed it. `None` when the input does not match.
pub(crate) fn trace(pattern: &WildcardPattern, input: &[char]) -> Option<Vec<usize>> {
    let tokens = pattern.tokens();
    let types = pattern.types();
    let separator = pattern.separator();
    let len = input.len();
    let width = len + 1;

    let mut visited = vec![false; types.len() * width];
    let mut owners = vec![0usize; len];
    // Star states that may still swallow one more character.
    let mut choices: Vec<(usize, usize)> = Vec::new();

    let mut ti = 0;
    let mut ci = 0;

    'search: loop {
        let advanced = if ci == len {
            if types[ti..].iter().all(|t| t.can_match_empty()) {
                return Some(owners);
            }
            false
        } else {
            let c = input[ci];
            match types[ti] {
                TokenType::End => false,
                TokenType::Literal | TokenType::Separator => {
                    if tokens[ti] == c {
                        owners[ci] = ti;
                        ti += 1;
                        ci += 1;
                        true
                    } else {
                        false
                    }
                }
                TokenType::Question | TokenType::Plus => {
                    if Some(c) != separator {
                        owners[ci] = ti;
                        ti += 1;
                        ci += 1;
                        true
                    } else {
                        false
                    }
                }
                TokenType::Star | TokenType::StarStar => {
                    let state = ti * width + ci;
                    if visited[state] {
                        false
                    } else {
                        visited[state] = true;
                        choices.push((ti, ci));
                        ti += 1;
                        true
                    }
                }
            }
        };

        if advanced {
            continue;
        }

        // Resume the latest star that can still grow.
        while let Some((star_ti, star_ci)) = choices.pop() {
            let c = input[star_ci];
            if types[star_ti] == TokenType::Star && Some(c) == separator {
                continue;
            }
            owners[star_ci] = star_ti;
            ti = star_ti;
            ci = star_ci + 1;
            continue 'search;
        }

        return None;
    }
}

/// Erase the characters matched by literal tokens and keep the ones consumed by
/// wildcards.
///
/// ```text
/// pattern "com.example.**"  separator '.'
/// input   "com.example.web.UserAction"
/// mask    "web.UserAction"
/// ```
///
/// Rules:
///
/// - A separator matched by a separator token is kept only when it directly
///   follows a non-empty `*` / `**` run, so multi-segment remainders stay joined.
/// - When the pattern starts with `*` or `**`, leading separators are trimmed
///   from the result.
/// - A non-matching input yields `None`, except for patterns that start with
///   `**`: these strip a prefix rather than validate it, and yield the input with
///   its leading separators trimmed.
pub(crate) fn mask(pattern: &WildcardPattern, input: &str) -> Option<String> {
    let types = pattern.types();
    let separator = pattern.separator();
    let chars: Vec<char> = input.chars().collect();

    let Some(owners) = trace(pattern, &chars) else {
        if types.first() == Some(&TokenType::StarStar) {
            return Some(trim_leading_separators(input, separator).to_string());
        }
        return None;
    };

    let mut masked = String::with_capacity(chars.len());
    let mut previous_kept = false;
    for (ci, &c) in chars.iter().enumerate() {
        let ti = owners[ci];
        let keep = match types[ti] {
            t if t.is_wildcard() => true,
            TokenType::Separator => previous_kept && ti > 0 && types[ti - 1].is_star(),
            _ => false,
        };
        if keep {
            masked.push(c);
        }
        previous_kept = keep;
    }

    if types.first().is_some_and(|t| t.is_star()) {
        return Some(trim_leading_separators(&masked, separator).to_string());
    }
    Some(masked)
}

fn trim_leading_separators(s: &str, separator: Option<char>) -> &str {
    match separator {
        Some(sep) => s.trim_start_matches(sep),
        None => s,
    }
}

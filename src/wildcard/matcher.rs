//! Stateful matcher that remembers the separator-delimited groups of the last
//! input it saw.
//!
//! ```text
//! pattern "/static/**"  separator '/'
//! input   "/static/css/site.css"
//!
//! group:   0   1        2     3
//!          ""  "static" "css" "site.css"
//! ```
//!
//! Groups are numbered from zero; there is always one more group than there
//! are separators. A cursor walks the groups for callers that want to consume
//! them in order (`next_segment`) or in reverse (`last` + `prev_segment`).

use super::WildcardPattern;

#[derive(Debug, Clone)]
pub struct WildcardMatcher<'p> {
    pattern: &'p WildcardPattern,
    input: Option<String>,
    /// Byte offsets of every separator in `input`.
    separators: Vec<usize>,
    /// `None` once `prev_segment` has walked past group 0.
    cursor: Option<usize>,
}

impl<'p> WildcardMatcher<'p> {
    pub fn new(pattern: &'p WildcardPattern) -> Self {
        WildcardMatcher { pattern, input: None, separators: Vec::new(), cursor: Some(0) }
    }

    pub fn pattern(&self) -> &'p WildcardPattern {
        self.pattern
    }

    /// Match `input` and, on success, record its groups.
    ///
    /// A failed match clears any previously recorded groups.
    pub fn matches(&mut self, input: &str) -> bool {
        if self.pattern.matches(input) {
            self.record(input);
            true
        } else {
            self.input = None;
            self.separators.clear();
            self.cursor = Some(0);
            false
        }
    }

    /// Record the groups of `input` without matching it. Returns the number of
    /// separators found.
    pub fn separate(&mut self, input: &str) -> usize {
        self.record(input);
        self.separators.len()
    }

    fn record(&mut self, input: &str) {
        self.separators.clear();
        if let Some(sep) = self.pattern.separator() {
            self.separators.extend(input.char_indices().filter(|&(_, c)| c == sep).map(|(i, _)| i));
        }
        self.input = Some(input.to_string());
        self.cursor = Some(0);
    }

    /// Number of separators in the recorded input (`0` when nothing is recorded).
    pub fn separator_count(&self) -> usize {
        self.separators.len()
    }

    /// The text of `group`, or `None` when no input is recorded or the group is
    /// out of range.
    pub fn find(&self, group: usize) -> Option<&str> {
        let input = self.input.as_deref()?;
        if group > self.separators.len() {
            return None;
        }
        let sep_len = self.pattern.separator().map_or(0, char::len_utf8);
        let start = if group == 0 { 0 } else { self.separators[group - 1] + sep_len };
        let end = self.separators.get(group).copied().unwrap_or(input.len());
        input.get(start..end)
    }

    /// Move the cursor to the first group.
    pub fn first(&mut self) -> &mut Self {
        self.cursor = Some(0);
        self
    }

    /// Move the cursor to the last group.
    pub fn last(&mut self) -> &mut Self {
        self.cursor = Some(self.separators.len());
        self
    }

    pub fn has_next(&self) -> bool {
        self.input.is_some() && self.cursor.is_some_and(|c| c <= self.separators.len())
    }

    pub fn has_prev(&self) -> bool {
        self.input.is_some() && self.cursor.is_some()
    }

    /// Return the group under the cursor and advance.
    pub fn next_segment(&mut self) -> Option<&str> {
        let current = self.cursor?;
        if self.input.is_none() || current > self.separators.len() {
            return None;
        }
        self.cursor = Some(current + 1);
        self.find(current)
    }

    /// Return the group under the cursor and step back. A cursor past the end
    /// is clamped to the last group first.
    pub fn prev_segment(&mut self) -> Option<&str> {
        let current = self.cursor?.min(self.separators.len());
        if self.input.is_none() {
            return None;
        }
        self.cursor = current.checked_sub(1);
        self.find(current)
    }

    /// All recorded groups in order. Does not move the cursor.
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        let count = if self.input.is_some() { self.separators.len() + 1 } else { 0 };
        (0..count).filter_map(move |group| self.find(group))
    }
}

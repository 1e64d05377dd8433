//! Pattern compilation and wildcard capture.
//!
//! A pattern is a sequence of literal tokens and wildcards (`*` and `_`,
//! treated identically). It is compiled into one regex anchored at both
//! ends of the padded input:
//!
//! ```text
//! pattern: MY NAME IS *
//! regex:   (?i)^\s*MY\s+NAME\s+IS\s+(WORD(?:[inner]+WORD)*)[\s.!?]*$
//! input:   " My name is Ben. "
//!                          ^^^ capture 1 = "Ben"
//! ```
//!
//! Pattern tokens are separated by whitespace only, so `HELLO BEN` does not
//! match "Hello, Ben". Punctuation is tolerated inside a wildcard and in the
//! trailing sentence punctuation of the input, whether or not the pattern ends
//! in a wildcard. Matching is case-insensitive; captures
//! keep the casing of the input.

use super::normalize::{pad_input, strip_trailing_punctuation};
use regex::Regex;

/// A token a wildcard may consume.
const WORD: &str = r"[\p{L}\p{N}'’\-]+";
/// Separators allowed between tokens swallowed by one wildcard.
const INNER_SEPARATOR: &str = r"[\s,;:.!?]+";
/// Separator between two pattern tokens.
const TOKEN_SEPARATOR: &str = r"\s+";
/// What may follow the last pattern token.
const TRAILER: &str = r"[\s.!?]*$";

/// A compiled pattern.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    wildcards: usize,
    pattern: String,
}

impl Matcher {
    /// Compile `pattern` (already rendered to plain text).
    ///
    /// Literal tokens are regex-escaped, so compilation only fails when the
    /// resulting expression exceeds the regex size limits.
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = strip_trailing_punctuation(pattern.trim());
        let wildcard = format!("({WORD}(?:{INNER_SEPARATOR}{WORD})*)");

        let mut expr = String::from(r"(?i)^\s*");
        let mut wildcards = 0;
        for (idx, token) in pattern.split_whitespace().enumerate() {
            if idx > 0 {
                expr.push_str(TOKEN_SEPARATOR);
            }
            if is_wildcard(token) {
                expr.push_str(&wildcard);
                wildcards += 1;
            } else {
                expr.push_str(&regex::escape(token));
            }
        }
        expr.push_str(TRAILER);

        Ok(Matcher { regex: Regex::new(&expr)?, wildcards, pattern: pattern.to_string() })
    }

    /// The pattern text this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcards
    }

    /// Match `input` against the whole pattern and return the wildcard
    /// captures in left-to-right order, or `None` if the input does not match.
    pub fn captures(&self, input: &str) -> Option<Vec<String>> {
        let padded = pad_input(input);
        let caps = self.regex.captures(&padded)?;
        Some((1..=self.wildcards).filter_map(|i| caps.get(i)).map(|m| tidy_capture(m.as_str())).collect())
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(&pad_input(input))
    }
}

/// Compile-and-match in one step.
pub fn match_pattern(input: &str, pattern: &str) -> Option<Vec<String>> {
    compile_or_warn(pattern)?.captures(input)
}

/// Compile `pattern`, logging a warning and returning `None` on failure. A
/// pattern that cannot be compiled never matches.
pub(crate) fn compile_or_warn(pattern: &str) -> Option<Matcher> {
    match Matcher::compile(pattern) {
        Ok(matcher) => Some(matcher),
        Err(err) => {
            tracing::warn!(target: "aimlite::engine", pattern, error = %err, "pattern could not be compiled");
            None
        }
    }
}

fn is_wildcard(token: &str) -> bool {
    token == "*" || token == "_"
}

fn tidy_capture(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'));
    trimmed.strip_suffix('?').unwrap_or(trimmed).to_string()
}

//! Text normalization.
//!
//! Patterns, `<that>` text, the previous answer and user input must all go
//! through the same normalization before they are compared, otherwise the
//! that-context check silently never matches. The matcher handles case; this
//! module handles whitespace and punctuation.

/// Characters treated as sentence-final punctuation.
pub(crate) const SENTENCE_END: &[char] = &['.', '!', '?'];

/// Collapse runs of whitespace into a single space and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pad collapsed input with one separator on each side so a pattern token
/// can never match a prefix or suffix of a longer input word.
pub(crate) fn pad_input(text: &str) -> String {
    format!(" {} ", collapse_whitespace(text))
}

pub(crate) fn strip_trailing_punctuation(text: &str) -> &str {
    text.trim_end().trim_end_matches(|c: char| SENTENCE_END.contains(&c) || c.is_whitespace())
}

/// Replace whitespace runs that contain a raw line break (indentation in the
/// rule source) with a single space. Spaces on a single line are kept as-is.
pub(crate) fn collapse_line_breaks(text: &str) -> String {
    lazy_regex!(r"[ \t]*\r?\n\s*").replace_all(text, " ").into_owned()
}

/// Clean a produced answer: drop carriage returns and trim.
pub(crate) fn clean_output(text: &str) -> String {
    text.replace("\r\n", "").replace('\r', "").trim().to_string()
}

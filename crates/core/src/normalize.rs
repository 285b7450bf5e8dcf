//! Canonical form for answer text.
//!
//! Answer keys embed multi-line shell commands whose line-continuation
//! backslashes are spaced inconsistently. Two strings that differ only in
//! whitespace or in the spacing around a `\` normalize to the same value.

/// Normalizes `input` for comparison.
///
/// - every whitespace run (newlines included) becomes a single space
/// - leading and trailing whitespace is removed
/// - each backslash becomes its own token, separated by one space
///
/// The function is total and idempotent.
#[must_use]
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for token in tokens(input) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

/// Splits on whitespace and isolates every backslash as a separate token.
fn tokens(input: &str) -> impl Iterator<Item = &str> {
    input.split_whitespace().flat_map(split_backslashes)
}

fn split_backslashes(word: &str) -> impl Iterator<Item = &str> {
    let mut rest = word;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let token = match rest.find('\\') {
            Some(0) => &rest[..1],
            Some(pos) => &rest[..pos],
            None => rest,
        };
        rest = &rest[token.len()..];
        Some(token)
    })
}

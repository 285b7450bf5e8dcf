use std::collections::BTreeSet;

use crate::normalize::normalize;

/// Display flag computed for one option after grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Part of the answer key, whether selected or not.
    Correct,
    /// Selected but not part of the answer key.
    Incorrect,
    /// Neither selected nor correct.
    Neutral,
}

/// Returns true when `selected` matches `correct` exactly.
///
/// Both sets are expected to hold normalized text. An empty selection is never
/// equal to a non-empty key.
#[must_use]
pub fn grade(selected: &BTreeSet<String>, correct: &BTreeSet<String>) -> bool {
    selected.len() == correct.len() && correct.iter().all(|c| selected.contains(c))
}

/// Normalizes every entry of `items` into a set.
#[must_use]
pub fn normalized_set<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().map(|s| normalize(s.as_ref())).collect()
}

/// Computes a mark for each of `options`, in the same order.
///
/// `selected` and `correct` hold normalized text; options are normalized here.
#[must_use]
pub fn mark_options<S: AsRef<str>>(
    options: &[S],
    selected: &BTreeSet<String>,
    correct: &BTreeSet<String>,
) -> Vec<OptionMark> {
    options
        .iter()
        .map(|option| {
            let value = normalize(option.as_ref());
            if correct.contains(&value) {
                OptionMark::Correct
            } else if selected.contains(&value) {
                OptionMark::Incorrect
            } else {
                OptionMark::Neutral
            }
        })
        .collect()
}

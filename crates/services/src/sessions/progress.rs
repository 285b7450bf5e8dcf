/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    /// 1-based position of the current question.
    pub position: usize,
    pub answered: usize,
    /// Share of questions before the current one, 0..=100.
    pub percent: u8,
    pub is_last: bool,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub(crate) fn new(total: usize, current_index: usize, answered: usize, is_complete: bool) -> Self {
        let percent = if total == 0 {
            0
        } else {
            u8::try_from(current_index.min(total) * 100 / total).unwrap_or(100)
        };
        Self {
            total,
            position: (current_index + 1).min(total),
            answered,
            percent,
            is_last: current_index + 1 >= total,
            is_complete,
        }
    }
}

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Whole seconds from `start` to `end`, clamped at zero.
#[must_use]
pub fn elapsed_secs(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_seconds()).unwrap_or(0)
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

//
// ─── DURATION TEXT ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,

    #[error("invalid duration component: {0}")]
    InvalidComponent(String),

    #[error("duration component out of order: {0}")]
    OutOfOrder(String),
}

/// Formats seconds as `"1h 2m 3s"`, `"2m 3s"` or `"3s"`.
///
/// Minutes are always shown once hours are present, seconds are always shown.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;

    let mut parts = Vec::with_capacity(3);
    if h > 0 {
        parts.push(format!("{h}h"));
    }
    if m > 0 || h > 0 {
        parts.push(format!("{m}m"));
    }
    parts.push(format!("{s}s"));
    parts.join(" ")
}

/// Parses the output of [`format_duration`] back into seconds.
///
/// Components must appear in `h`, `m`, `s` order; each is optional but at least
/// one must be present.
///
/// # Errors
///
/// Returns `DurationParseError` for empty input, unknown units, non-numeric
/// values, repeated units or units out of order.
pub fn parse_duration(text: &str) -> Result<u64, DurationParseError> {
    let mut total: u64 = 0;
    let mut last_rank = 0_u8;
    let mut seen_any = false;

    for part in text.split_whitespace() {
        let Some(unit) = part.chars().last() else {
            continue;
        };
        let value = &part[..part.len() - unit.len_utf8()];
        let (rank, scale) = match unit {
            'h' => (1, 3600),
            'm' => (2, 60),
            's' => (3, 1),
            _ => return Err(DurationParseError::InvalidComponent(part.to_owned())),
        };
        if rank <= last_rank {
            return Err(DurationParseError::OutOfOrder(part.to_owned()));
        }
        let value: u64 = value
            .parse()
            .map_err(|_| DurationParseError::InvalidComponent(part.to_owned()))?;
        total = value
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| DurationParseError::InvalidComponent(part.to_owned()))?;
        last_rank = rank;
        seen_any = true;
    }

    if seen_any {
        Ok(total)
    } else {
        Err(DurationParseError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_and_reports_elapsed() {
        let mut clock = fixed_clock();
        let start = clock.now();
        clock.advance(Duration::seconds(95));
        assert_eq!(elapsed_secs(start, clock.now()), 95);
    }

    #[test]
    fn elapsed_is_clamped_when_end_is_before_start() {
        let later = fixed_now() + Duration::seconds(10);
        assert_eq!(elapsed_secs(later, fixed_now()), 0);
    }

    #[test]
    fn default_clock_does_not_advance() {
        let mut clock = Clock::default_clock();
        let before = clock.now();
        clock.advance(Duration::days(1));
        assert!(clock.now() - before < Duration::hours(1));
    }

    #[test]
    fn formats_like_the_history_table() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
        assert_eq!(format_duration(5400), "1h 30m 0s");
    }

    #[test]
    fn parses_formatted_durations_back() {
        for secs in [0, 7, 60, 61, 3599, 3600, 3661, 5400, 90_061] {
            assert_eq!(parse_duration(&format_duration(secs)).unwrap(), secs);
        }
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_duration("  "), Err(DurationParseError::Empty));
        assert!(matches!(
            parse_duration("3x"),
            Err(DurationParseError::InvalidComponent(_))
        ));
        assert!(matches!(
            parse_duration("5s 1m"),
            Err(DurationParseError::OutOfOrder(_))
        ));
        assert!(matches!(
            parse_duration("am"),
            Err(DurationParseError::InvalidComponent(_))
        ));
    }
}

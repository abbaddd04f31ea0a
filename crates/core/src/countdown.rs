use std::fmt;

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_SECOND: i64 = 1_000;

/// Pure remaining-time derivation for a timed attempt.
///
/// The countdown owns no interval: callers re-evaluate it from a periodic
/// tick of their own and tear that tick down themselves. Remaining time is
/// derived from the start timestamp every call, so a missed or delayed tick
/// can never drift the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration_minutes: u32,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_minutes: u32) -> Self {
        Self { duration_minutes }
    }

    #[must_use]
    pub fn duration_minutes(self) -> u32 {
        self.duration_minutes
    }

    /// Total duration in milliseconds.
    #[must_use]
    pub fn duration_ms(self) -> i64 {
        i64::from(self.duration_minutes) * MS_PER_MINUTE
    }

    /// Milliseconds left at `now_ms`.
    ///
    /// An absent start timestamp reads as zero remaining. The result is
    /// clamped at zero and never negative.
    #[must_use]
    pub fn remaining_ms(self, started_at_ms: Option<i64>, now_ms: i64) -> i64 {
        let Some(started_at_ms) = started_at_ms else {
            return 0;
        };
        (started_at_ms + self.duration_ms() - now_ms).max(0)
    }

    #[must_use]
    pub fn is_expired(self, started_at_ms: Option<i64>, now_ms: i64) -> bool {
        self.remaining_ms(started_at_ms, now_ms) == 0
    }

    #[must_use]
    pub fn display(self, started_at_ms: Option<i64>, now_ms: i64) -> TimeDisplay {
        TimeDisplay::from_ms(self.remaining_ms(started_at_ms, now_ms))
    }
}

/// Minutes/seconds split of a remaining-time value, for the header bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDisplay {
    pub minutes: u32,
    pub seconds: u32,
}

impl TimeDisplay {
    #[must_use]
    pub fn from_ms(remaining_ms: i64) -> Self {
        let total_seconds = remaining_ms.max(0) / MS_PER_SECOND;
        let minutes = u32::try_from(total_seconds / 60).unwrap_or(u32::MAX);
        let seconds = u32::try_from(total_seconds % 60).unwrap_or(0);
        Self { minutes, seconds }
    }

    /// Zero-padded `MM:SS` label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}

impl fmt::Display for TimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_duration_at_start() {
        let countdown = Countdown::new(45);
        let start = 1_000_000;
        assert_eq!(countdown.remaining_ms(Some(start), start), 45 * 60_000);
    }

    #[test]
    fn remaining_is_non_increasing() {
        let countdown = Countdown::new(10);
        let start = 5_000;
        let mut previous = countdown.remaining_ms(Some(start), start);
        for step in 1..=30 {
            let now = start + step * 777;
            let remaining = countdown.remaining_ms(Some(start), now);
            assert!(remaining <= previous);
            previous = remaining;
        }
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let countdown = Countdown::new(1);
        let start = 0;
        assert_eq!(countdown.remaining_ms(Some(start), start + 60_001), 0);
        assert!(countdown.is_expired(Some(start), start + 60_000));
    }

    #[test]
    fn absent_start_reads_as_expired() {
        let countdown = Countdown::new(30);
        assert_eq!(countdown.remaining_ms(None, 123_456), 0);
        assert!(countdown.is_expired(None, 123_456));
    }

    #[test]
    fn display_zero_pads() {
        assert_eq!(TimeDisplay::from_ms(9 * 60_000 + 5_000).label(), "09:05");
        assert_eq!(TimeDisplay::from_ms(0).label(), "00:00");
        assert_eq!(TimeDisplay::from_ms(61_000).to_string(), "01:01");
    }

    #[test]
    fn display_truncates_sub_second_remainder() {
        assert_eq!(TimeDisplay::from_ms(59_999).label(), "00:59");
    }
}

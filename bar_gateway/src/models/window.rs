//! Trailing query window anchored at the start of the current UTC day.

use chrono::{DateTime, Duration, Utc};

/// How far back a bar query reaches from the window end.
pub const LOOKBACK_DAYS: i64 = 365;

/// A half-open `[start, end)` range of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The [`LOOKBACK_DAYS`] window ending at midnight UTC of `now`'s date.
    ///
    /// `start < end` always holds because the lookback is a positive constant.
    pub fn trailing(now: DateTime<Utc>) -> Self {
        let end = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now);
        let start = end - Duration::days(LOOKBACK_DAYS);
        Self { start, end }
    }
}

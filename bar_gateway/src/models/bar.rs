//! Bar shapes on both sides of the gateway.
//!
//! [`Bar`] is the vendor-agnostic record every [`DataProvider`](crate::providers::DataProvider)
//! returns. [`BarRecord`] is the fixed-shape row handed back to HTTP callers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer, ser::SerializeTuple};
use thiserror::Error;

/// A single time-series bar (OHLCV) for a given timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// The timestamp for this bar (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded during the bar interval.
    pub volume: u64,

    /// Trade count for the bar. Not all providers supply this.
    pub trade_count: Option<u64>,

    /// Volume-weighted average price. Not all providers supply this.
    pub vwap: Option<f64>,
}

/// One page of bars as returned by a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarPage {
    /// Bars in the order the provider returned them.
    pub bars: Vec<Bar>,
    /// Set when the provider has more bars than fit in this page.
    pub next_page_token: Option<String>,
}

/// A bar whose values cannot be represented in a [`BarRecord`].
#[derive(Debug, Error, PartialEq)]
#[error("bar at {timestamp} has invalid {field}: {value}")]
pub struct BarMappingError {
    pub timestamp: DateTime<Utc>,
    pub field: &'static str,
    pub value: f64,
}

/// Output row, serialized positionally as
/// `[timestamp, open, close, low, high, volume]`.
///
/// The close-before-low/high order is part of the wire contract with existing
/// chart clients.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRecord {
    pub timestamp: String,
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
    pub volume: u64,
}

impl TryFrom<&Bar> for BarRecord {
    type Error = BarMappingError;

    fn try_from(bar: &Bar) -> Result<Self, Self::Error> {
        for (field, value) in [
            ("open", bar.open),
            ("close", bar.close),
            ("low", bar.low),
            ("high", bar.high),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BarMappingError {
                    timestamp: bar.timestamp,
                    field,
                    value,
                });
            }
        }

        Ok(Self {
            timestamp: bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            open: bar.open,
            close: bar.close,
            low: bar.low,
            high: bar.high,
            volume: bar.volume,
        })
    }
}

impl Serialize for BarRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(6)?;
        row.serialize_element(&self.timestamp)?;
        row.serialize_element(&self.open)?;
        row.serialize_element(&self.close)?;
        row.serialize_element(&self.low)?;
        row.serialize_element(&self.high)?;
        row.serialize_element(&self.volume)?;
        row.end()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2025, 5, 30, 4, 0, 0).unwrap(),
            open: 100.5,
            high: 105.0,
            low: 99.25,
            close: 104.0,
            volume: 1_234_567,
            trade_count: Some(4200),
            vwap: Some(102.1),
        }
    }

    #[test]
    fn record_keeps_close_before_low_and_high() {
        let record = BarRecord::try_from(&sample_bar()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!(["2025-05-30T04:00:00Z", 100.5, 104.0, 99.25, 105.0, 1_234_567])
        );
    }

    #[test]
    fn non_finite_price_is_rejected() {
        let mut bar = sample_bar();
        bar.high = f64::NAN;
        let err = BarRecord::try_from(&bar).unwrap_err();
        assert_eq!(err.field, "high");
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut bar = sample_bar();
        bar.low = -0.01;
        let err = BarRecord::try_from(&bar).unwrap_err();
        assert_eq!(err.field, "low");
        assert!(err.to_string().contains("low"));
    }
}

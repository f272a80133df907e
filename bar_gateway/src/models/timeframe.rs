//! Bar granularity accepted by the gateway.
//!
//! The string grammar follows the upstream data API: an amount followed by a
//! unit, where the unit is either spelled out or abbreviated (`5Min`/`5T`,
//! `2Hour`/`2H`, `1Day`/`1D`, `1Week`/`1W`, `3Month`/`3M`). Parsing validates
//! the amount for each unit, so a [`TimeFrame`] that exists is always one the
//! upstream will accept.

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub fn new(amount: u32, unit: TimeFrameUnit) -> Result<Self, TimeFrameError> {
        Self::validate(amount, unit)?;
        Ok(Self { amount, unit })
    }

    pub const fn day() -> Self {
        Self {
            amount: 1,
            unit: TimeFrameUnit::Day,
        }
    }

    fn validate(amount: u32, unit: TimeFrameUnit) -> Result<(), TimeFrameError> {
        match unit {
            TimeFrameUnit::Minute if !(1..=59).contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Minute units can only be used with amounts between 1-59.".into(),
                })
            }
            TimeFrameUnit::Hour if !(1..=23).contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Hour units can only be used with amounts 1-23".into(),
                })
            }
            TimeFrameUnit::Day | TimeFrameUnit::Week if amount != 1 => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Day and Week units can only be used with amount 1".into(),
                })
            }
            TimeFrameUnit::Month if ![1, 2, 3, 4, 6, 12].contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Month units can only be used with amount 1, 2, 3, 4, 6 and 12"
                        .into(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::day()
    }
}

/// Canonical upstream form (`5Min`, `2Hour`, `1Day`, `1Week`, `3Month`).
impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeFrameUnit::Minute => "Min",
            TimeFrameUnit::Hour => "Hour",
            TimeFrameUnit::Day => "Day",
            TimeFrameUnit::Week => "Week",
            TimeFrameUnit::Month => "Month",
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeFrameError::InvalidInput {
                message: format!("missing unit in timeframe {s:?}"),
            })?;
        let (digits, unit) = s.split_at(split);
        if digits.is_empty() {
            return Err(TimeFrameError::InvalidInput {
                message: format!("missing amount in timeframe {s:?}"),
            });
        }
        let amount: u32 = digits.parse().map_err(|_| TimeFrameError::InvalidInput {
            message: format!("amount out of range in timeframe {s:?}"),
        })?;
        let unit = match unit {
            "Min" | "T" => TimeFrameUnit::Minute,
            "Hour" | "H" => TimeFrameUnit::Hour,
            "Day" | "D" => TimeFrameUnit::Day,
            "Week" | "W" => TimeFrameUnit::Week,
            "Month" | "M" => TimeFrameUnit::Month,
            other => {
                return Err(TimeFrameError::InvalidInput {
                    message: format!("unknown timeframe unit {other:?}"),
                });
            }
        };
        TimeFrame::new(amount, unit)
    }
}

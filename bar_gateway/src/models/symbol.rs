use std::{fmt, str::FromStr};

use thiserror::Error;

const MAX_SYMBOL_LEN: usize = 21;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol is empty")]
    Empty,

    #[error("symbol is longer than {MAX_SYMBOL_LEN} characters")]
    TooLong,

    #[error("symbol contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A normalized equity ticker: trimmed, upper-cased, `A-Z 0-9 . / -` only,
/// starting with a letter or digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol(String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let first = normalized.chars().next().ok_or(SymbolError::Empty)?;
        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(SymbolError::TooLong);
        }
        if !first.is_ascii_alphanumeric() {
            return Err(SymbolError::InvalidChar(first));
        }
        if let Some(bad) = normalized
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '-')))
        {
            return Err(SymbolError::InvalidChar(bad));
        }
        Ok(Self(normalized))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

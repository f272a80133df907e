use thiserror::Error;

use crate::models::{symbol::SymbolError, timeframe::TimeFrameError};

/// The unified error type for the `bar_gateway` crate.
///
/// Every failure a bar query can hit is classified into one of these variants
/// before it leaves the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rejected before contacting the upstream (bad symbol or timeframe).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The upstream does not know the requested ticker.
    #[error("Unknown symbol: {0}")]
    InvalidSymbol(String),

    /// Transport failure, timeout, auth failure, or throttling. Retryable.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream answered with data we could not interpret.
    #[error("Upstream data error: {0}")]
    UpstreamDataError(String),
}

impl GatewayError {
    /// Stable snake_case name used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidSymbol(_) => "invalid_symbol",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UpstreamDataError(_) => "upstream_data_error",
        }
    }
}

impl From<TimeFrameError> for GatewayError {
    fn from(e: TimeFrameError) -> Self {
        Self::InvalidArgument(format!("timeframe: {e}"))
    }
}

impl From<SymbolError> for GatewayError {
    fn from(e: SymbolError) -> Self {
        Self::InvalidArgument(format!("symbol: {e}"))
    }
}

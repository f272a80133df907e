//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, the single seam between the
//! gateway and any market data vendor. Each concrete provider (currently only
//! [`alpaca_rest::AlpacaProvider`]) translates [`BarsRequestParams`] into its
//! own API call and reports failures as a [`ProviderError`] whose variant says
//! *why* the call failed, so the gateway can classify it for callers.
//!
//! The trait is object safe and used as `Arc<dyn DataProvider + Send + Sync>`,
//! which lets tests swap in a stub without touching the gateway.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use bar_gateway::models::{bar::BarPage, request_params::BarsRequestParams};
//! use bar_gateway::providers::{DataProvider, ProviderError};
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl DataProvider for EmptyProvider {
//!     async fn fetch_bars(&self, _params: BarsRequestParams) -> Result<BarPage, ProviderError> {
//!         Ok(BarPage::default())
//!     }
//! }
//! ```

pub mod alpaca_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{bar::BarPage, request_params::BarsRequestParams};

/// Trait for fetching one page of bar data from a market data provider.
///
/// Implementations must be safe to call concurrently; the gateway shares one
/// instance across all in-flight requests.
#[async_trait]
pub trait DataProvider {
    /// Fetches a single page of bars for the given request parameters.
    ///
    /// # Returns
    ///
    /// * `Ok(BarPage)` - Bars in provider order, plus a continuation token if
    ///   the provider had more data than fit in the page.
    /// * `Err(ProviderError)` - The failure, classified by cause.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarPage, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Network-level failure (connect, TLS, reset, body read).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider rejected our credentials.
    #[snafu(display("API rejected credentials ({status}): {message}"))]
    Unauthorized {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The provider is throttling us.
    #[snafu(display("API rate limit exceeded: {message}"))]
    RateLimited {
        message: String,
        backtrace: Backtrace,
    },

    /// The provider does not recognize the requested ticker.
    #[snafu(display("Unknown symbol {symbol}: {message}"))]
    InvalidSymbol {
        symbol: String,
        message: String,
        backtrace: Backtrace,
    },

    /// Any other non-success response.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The response body did not have the expected shape.
    #[snafu(display("Malformed API response: {source}"))]
    Decode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The response body exceeded the configured size cap.
    #[snafu(display("API response larger than {limit} bytes"))]
    BodyTooLarge { limit: usize, backtrace: Backtrace },
}

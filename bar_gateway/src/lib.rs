//! Historical stock bar gateway.
//!
//! Accepts a symbol and timeframe over HTTP, asks an upstream market data
//! provider for the trailing year of bars, and returns them as fixed-shape
//! `[timestamp, open, close, low, high, volume]` rows. Failures are classified
//! into [`errors::GatewayError`] instead of being folded into an empty result.

pub mod clock;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod models;
pub mod providers;

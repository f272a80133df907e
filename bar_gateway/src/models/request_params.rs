use crate::{
    models::{symbol::Symbol, timeframe::TimeFrame, window::TimeWindow},
    providers::alpaca_rest::params::AlpacaBarsParams,
};

/// Universal parameters for requesting bar data from a market data provider.
///
/// Validation of the symbol and timeframe has already happened by the time a
/// value of this type exists; providers only translate it to their wire format.
#[derive(Clone, Debug)]
pub struct BarsRequestParams {
    /// The ticker to request.
    pub symbol: Symbol,

    /// The time interval for each bar.
    pub timeframe: TimeFrame,

    /// Requested range. Providers return bars at or after `window.start` and
    /// strictly before `window.end`.
    pub window: TimeWindow,

    /// Maximum number of bars in the returned page.
    pub limit: u32,

    /// Continuation token from a previous page. `None` requests the first page.
    pub page_token: Option<String>,

    /// Optional, provider-specific parameters.
    pub provider_specific: ProviderParams,
}

/// Per-request options for a particular provider, kept out of the universal
/// [`BarsRequestParams`] fields.
#[derive(Clone, Debug, Default)]
pub enum ProviderParams {
    #[default]
    None,
    Alpaca(AlpacaBarsParams),
}

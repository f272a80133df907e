//! The bar query gateway: validate, window, fetch, reshape.
//!
//! [`BarQueryGateway::fetch_bars`] is the only operation. It holds no state
//! between calls beyond the shared provider and clock handles, so one instance
//! serves any number of concurrent requests without locking.

use std::{sync::Arc, time::Duration};

use tracing::{error, info, warn};

use crate::{
    clock::Clock,
    errors::GatewayError,
    models::{
        bar::BarRecord,
        request_params::{BarsRequestParams, ProviderParams},
        symbol::Symbol,
        timeframe::TimeFrame,
        window::TimeWindow,
    },
    providers::{
        DataProvider, ProviderError,
        alpaca_rest::{
            AlpacaBarsParams,
            params::{Adjustment, Feed, Sort},
        },
    },
};

/// Ticker used when the caller does not name one.
pub const DEFAULT_SYMBOL: &str = "MSFT";
/// Timeframe used when the caller does not name one.
pub const DEFAULT_TIMEFRAME: &str = "1D";
/// Largest page requested from the upstream.
pub const DEFAULT_MAX_BARS: u32 = 10_000;
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for [`BarQueryGateway`].
#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub upstream_timeout: Duration,
    pub max_bars: u32,
    pub feed: Feed,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            max_bars: DEFAULT_MAX_BARS,
            feed: Feed::Sip,
        }
    }
}

/// Outcome of a successful bar query.
#[derive(Debug, Clone, PartialEq)]
pub struct BarQueryResult {
    pub symbol: Symbol,
    pub timeframe: TimeFrame,
    pub window: TimeWindow,
    /// One record per upstream bar, in upstream order. May be empty.
    pub records: Vec<BarRecord>,
    /// The upstream had more bars than the page cap allowed.
    pub truncated: bool,
}

pub struct BarQueryGateway {
    provider: Arc<dyn DataProvider + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    settings: GatewaySettings,
}

impl BarQueryGateway {
    pub fn new(
        provider: Arc<dyn DataProvider + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            provider,
            clock,
            settings,
        }
    }

    /// Fetches the trailing year of bars for `symbol` at `timeframe`.
    ///
    /// Blank arguments fall back to [`DEFAULT_SYMBOL`] and
    /// [`DEFAULT_TIMEFRAME`]. Malformed arguments fail with
    /// [`GatewayError::InvalidArgument`] without contacting the upstream.
    pub async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<BarQueryResult, GatewayError> {
        let symbol = or_default(symbol, DEFAULT_SYMBOL);
        let timeframe = or_default(timeframe, DEFAULT_TIMEFRAME);

        let (symbol, timeframe) = match parse_query(symbol, timeframe) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(%symbol, %timeframe, kind = e.kind(), error = %e, "rejected bar query");
                return Err(e);
            }
        };

        let window = TimeWindow::trailing(self.clock.now());
        let params = BarsRequestParams {
            symbol: symbol.clone(),
            timeframe,
            window,
            limit: self.settings.max_bars,
            page_token: None,
            provider_specific: ProviderParams::Alpaca(AlpacaBarsParams {
                adjustment: Some(Adjustment::Raw),
                feed: Some(self.settings.feed),
                currency: Some("USD".to_string()),
                sort: Some(Sort::Asc),
            }),
        };

        let outcome = tokio::time::timeout(
            self.settings.upstream_timeout,
            self.provider.fetch_bars(params),
        )
        .await;

        let page = match outcome {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                let classified = classify(e);
                log_failure(&symbol, timeframe, &window, &classified);
                return Err(classified);
            }
            Err(_) => {
                let classified = GatewayError::UpstreamUnavailable(format!(
                    "no response within {} ms",
                    self.settings.upstream_timeout.as_millis()
                ));
                log_failure(&symbol, timeframe, &window, &classified);
                return Err(classified);
            }
        };

        let truncated =
            page.next_page_token.is_some() || page.bars.len() >= self.settings.max_bars as usize;

        let records = match page
            .bars
            .iter()
            .map(BarRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(records) => records,
            Err(e) => {
                let classified = GatewayError::UpstreamDataError(e.to_string());
                log_failure(&symbol, timeframe, &window, &classified);
                return Err(classified);
            }
        };

        info!(
            %symbol,
            %timeframe,
            start = %window.start,
            end = %window.end,
            bars = records.len(),
            truncated,
            "bar query served"
        );

        Ok(BarQueryResult {
            symbol,
            timeframe,
            window,
            records,
            truncated,
        })
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

fn parse_query(symbol: &str, timeframe: &str) -> Result<(Symbol, TimeFrame), GatewayError> {
    let timeframe: TimeFrame = timeframe.parse()?;
    let symbol: Symbol = symbol.parse()?;
    Ok((symbol, timeframe))
}

fn classify(e: ProviderError) -> GatewayError {
    match e {
        ProviderError::InvalidSymbol {
            ref symbol,
            ref message,
            ..
        } => {
            GatewayError::InvalidSymbol(format!("{symbol}: {message}"))
        }
        ProviderError::Decode { .. } | ProviderError::BodyTooLarge { .. } => {
            GatewayError::UpstreamDataError(e.to_string())
        }
        ProviderError::Reqwest { .. }
        | ProviderError::Unauthorized { .. }
        | ProviderError::RateLimited { .. }
        | ProviderError::Api { .. } => GatewayError::UpstreamUnavailable(e.to_string()),
    }
}

fn log_failure(symbol: &Symbol, timeframe: TimeFrame, window: &TimeWindow, e: &GatewayError) {
    match e {
        GatewayError::InvalidArgument(_) | GatewayError::InvalidSymbol(_) => warn!(
            %symbol,
            %timeframe,
            start = %window.start,
            end = %window.end,
            kind = e.kind(),
            error = %e,
            "bar query rejected"
        ),
        GatewayError::UpstreamUnavailable(_) | GatewayError::UpstreamDataError(_) => error!(
            %symbol,
            %timeframe,
            start = %window.start,
            end = %window.end,
            kind = e.kind(),
            error = %e,
            "bar query failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use snafu::ResultExt;

    use super::*;
    use crate::providers::{ApiSnafu, BodyTooLargeSnafu, DecodeSnafu, UnauthorizedSnafu};

    #[test]
    fn blank_arguments_use_defaults() {
        assert_eq!(or_default("", DEFAULT_SYMBOL), "MSFT");
        assert_eq!(or_default("  ", DEFAULT_TIMEFRAME), "1D");
        assert_eq!(or_default("tsla", DEFAULT_SYMBOL), "tsla");
    }

    #[test]
    fn parse_query_reports_timeframe_first() {
        let err = parse_query("$$$", "7Y").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(ref m) if m.starts_with("timeframe")));
    }

    #[test]
    fn provider_errors_are_classified() {
        let unauthorized = UnauthorizedSnafu {
            status: 401u16,
            message: "bad key",
        }
        .build();
        assert_eq!(classify(unauthorized).kind(), "upstream_unavailable");

        let api = ApiSnafu {
            status: 500u16,
            message: "oops",
        }
        .build();
        assert_eq!(classify(api).kind(), "upstream_unavailable");

        let oversized = BodyTooLargeSnafu { limit: 1024usize }.build();
        assert_eq!(classify(oversized).kind(), "upstream_data_error");

        let decode = serde_json::from_str::<u8>("nope")
            .context(DecodeSnafu)
            .unwrap_err();
        assert_eq!(classify(decode).kind(), "upstream_data_error");
    }
}

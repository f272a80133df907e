use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::bar::Bar;

#[derive(Deserialize, Debug)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: u64,
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

impl From<AlpacaBar> for Bar {
    fn from(ab: AlpacaBar) -> Self {
        Bar {
            timestamp: ab.timestamp,
            open: ab.open,
            high: ab.high,
            low: ab.low,
            close: ab.close,
            volume: ab.volume,
            trade_count: ab.trade_count,
            vwap: ab.vwap,
        }
    }
}

/// Body of `GET /v2/stocks/bars`.
///
/// `bars` is `null` when nothing matched, and symbols without data are left
/// out of the map.
#[derive(Deserialize, Debug)]
pub struct AlpacaResponse {
    #[serde(default)]
    pub bars: Option<IndexMap<String, Vec<AlpacaBar>>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl AlpacaResponse {
    /// Removes and returns the bars for `symbol`, empty if there are none.
    pub fn take_bars(&mut self, symbol: &str) -> Vec<AlpacaBar> {
        self.bars
            .as_mut()
            .and_then(|bars| bars.shift_remove(symbol))
            .unwrap_or_default()
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Deserialize, Debug)]
pub struct AlpacaErrorBody {
    pub message: String,
}

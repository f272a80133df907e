use chrono::SecondsFormat;
use serde::Deserialize;

use crate::models::request_params::{BarsRequestParams, ProviderParams};

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

impl Adjustment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Split => "split",
            Self::Dividend => "dividend",
            Self::All => "all",
        }
    }
}

/// Specifies the source feed for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Iex => "iex",
            Self::Otc => "otc",
        }
    }
}

impl std::str::FromStr for Feed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sip" => Ok(Self::Sip),
            "iex" => Ok(Self::Iex),
            "otc" => Ok(Self::Otc),
            other => Err(format!("unknown feed: {other}")),
        }
    }
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, Default)]
pub struct AlpacaBarsParams {
    pub adjustment: Option<Adjustment>,
    pub feed: Option<Feed>,
    pub currency: Option<String>,
    pub sort: Option<Sort>,
}

/// Builds the query string for `GET /v2/stocks/bars`.
///
/// Unset Alpaca-specific options are left out so the API applies its own
/// defaults.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("symbols", params.symbol.to_string()),
        ("timeframe", params.timeframe.to_string()),
        (
            "start",
            params.window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "end",
            params.window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        ("limit", params.limit.to_string()),
    ];

    if let ProviderParams::Alpaca(alpaca) = &params.provider_specific {
        if let Some(adjustment) = alpaca.adjustment {
            query.push(("adjustment", adjustment.as_str().to_string()));
        }
        if let Some(feed) = alpaca.feed {
            query.push(("feed", feed.as_str().to_string()));
        }
        if let Some(currency) = &alpaca.currency {
            query.push(("currency", currency.clone()));
        }
        if let Some(sort) = alpaca.sort {
            query.push(("sort", sort.as_str().to_string()));
        }
    }

    if let Some(token) = &params.page_token {
        query.push(("page_token", token.clone()));
    }

    query
}

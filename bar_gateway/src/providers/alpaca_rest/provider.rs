use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, Response, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{
    models::{
        bar::{Bar, BarPage},
        request_params::BarsRequestParams,
    },
    providers::{
        ApiSnafu, BodyTooLargeSnafu, ClientBuildSnafu, DataProvider, DecodeSnafu,
        InvalidApiKeySnafu, InvalidSymbolSnafu, MissingEnvVarSnafu, ProviderError,
        ProviderInitError, RateLimitedSnafu, ReqwestSnafu, UnauthorizedSnafu,
        alpaca_rest::{
            params::construct_params,
            response::{AlpacaErrorBody, AlpacaResponse},
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets";
const BARS_PATH: &str = "/v2/stocks/bars";
/// A full 10k-bar page is roughly 1.5 MB of JSON.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Alpaca's free-tier quota.
pub fn default_requests_per_minute() -> NonZeroU32 {
    nonzero!(200u32)
}

/// Connection settings for [`AlpacaProvider`]. Credentials are passed separately.
#[derive(Clone, Debug)]
pub struct AlpacaSettings {
    /// Scheme and host of the market data API, without a trailing path.
    pub base_url: String,
    /// Client-side request budget.
    pub requests_per_minute: NonZeroU32,
    /// Responses larger than this are rejected without being buffered.
    pub max_body_bytes: usize,
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_minute: default_requests_per_minute(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

pub struct AlpacaProvider {
    client: Client,
    bars_url: String,
    limiter: DefaultDirectRateLimiter,
    max_body_bytes: usize,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn new(settings: AlpacaSettings) -> Result<Self, ProviderInitError> {
        let api_key =
            SecretString::from(get_env_var("APCA_API_KEY_ID").context(MissingEnvVarSnafu)?);
        let secret_key =
            SecretString::from(get_env_var("APCA_API_SECRET_KEY").context(MissingEnvVarSnafu)?);
        Self::with_credentials(api_key, secret_key, settings)
    }

    /// Creates a provider from explicit credentials.
    pub fn with_credentials(
        api_key: SecretString,
        secret_key: SecretString,
        settings: AlpacaSettings,
    ) -> Result<Self, ProviderInitError> {
        let mut key_header =
            header::HeaderValue::from_str(api_key.expose_secret()).context(InvalidApiKeySnafu)?;
        key_header.set_sensitive(true);
        let mut secret_header = header::HeaderValue::from_str(secret_key.expose_secret())
            .context(InvalidApiKeySnafu)?;
        secret_header.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("APCA-API-KEY-ID", key_header);
        headers.insert("APCA-API-SECRET-KEY", secret_header);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            bars_url: format!("{}{}", settings.base_url.trim_end_matches('/'), BARS_PATH),
            limiter: RateLimiter::direct(Quota::per_minute(settings.requests_per_minute)),
            max_body_bytes: settings.max_body_bytes,
        })
    }
}

/// Reads the body as text, failing once it grows past `limit` bytes.
async fn read_body(mut response: Response, limit: usize) -> Result<String, ProviderError> {
    if let Some(len) = response.content_length() {
        ensure!(len <= limit as u64, BodyTooLargeSnafu { limit });
    }

    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await.context(ReqwestSnafu)? {
        ensure!(buf.len() + chunk.len() <= limit, BodyTooLargeSnafu { limit });
        buf.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Maps a non-success status and its body to a [`ProviderError`].
fn error_from_status(status: StatusCode, body: &str, symbol: &str) -> ProviderError {
    let message = serde_json::from_str::<AlpacaErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("Unknown API error").to_string()
            } else {
                trimmed.to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UnauthorizedSnafu {
            status: status.as_u16(),
            message,
        }
        .build(),
        StatusCode::TOO_MANY_REQUESTS => RateLimitedSnafu { message }.build(),
        StatusCode::NOT_FOUND => InvalidSymbolSnafu { symbol, message }.build(),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
            if message.to_ascii_lowercase().contains("symbol") =>
        {
            InvalidSymbolSnafu { symbol, message }.build()
        }
        _ => ApiSnafu {
            status: status.as_u16(),
            message,
        }
        .build(),
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarPage, ProviderError> {
        let query = construct_params(&params);
        let symbol = params.symbol.as_str();

        self.limiter.until_ready().await;

        let response = self
            .client
            .get(&self.bars_url)
            .query(&query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = read_body(response, self.max_body_bytes).await?;
        debug!(%symbol, status = status.as_u16(), bytes = body.len(), "alpaca bars response");

        if !status.is_success() {
            return Err(error_from_status(status, &body, symbol));
        }

        let mut alpaca_response: AlpacaResponse =
            serde_json::from_str(&body).context(DecodeSnafu)?;

        let bars = alpaca_response
            .take_bars(symbol)
            .into_iter()
            .map(Bar::from)
            .collect();

        Ok(BarPage {
            bars,
            next_page_token: alpaca_response.next_page_token,
        })
    }
}

//! HTTP surface: `GET /api/stock-data` and `GET /health`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::{errors::GatewayError, gateway::BarQueryGateway};

/// Response header carrying `BarQueryResult::truncated`.
pub const TRUNCATED_HEADER: HeaderName = HeaderName::from_static("x-bars-truncated");

#[derive(Debug, Default, Deserialize)]
pub struct StockDataQuery {
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSymbol(_) => StatusCode::NOT_FOUND,
            Self::UpstreamDataError(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Builds the application router around a shared gateway.
///
/// `allowed_origins` feeds the CORS layer; entries that are not valid header
/// values are skipped with a warning.
pub fn router(gateway: Arc<BarQueryGateway>, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .expose_headers([TRUNCATED_HEADER]);

    Router::new()
        .route("/api/stock-data", get(stock_data))
        .route("/health", get(health))
        .layer(cors)
        .with_state(gateway)
}

async fn stock_data(
    State(gateway): State<Arc<BarQueryGateway>>,
    query: Result<Query<StockDataQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(q) = query.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected query string");
        GatewayError::InvalidArgument(format!("query: {}", rejection.body_text()))
    })?;

    let result = gateway
        .fetch_bars(
            q.symbol.as_deref().unwrap_or_default(),
            q.timeframe.as_deref().unwrap_or_default(),
        )
        .await?;

    let truncated = HeaderValue::from_static(if result.truncated { "true" } else { "false" });
    Ok(([(TRUNCATED_HEADER, truncated)], Json(result.records)).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

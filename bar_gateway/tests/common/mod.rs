#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bar_gateway::{
    clock::FixedClock,
    gateway::{BarQueryGateway, GatewaySettings},
    models::{
        bar::{Bar, BarPage},
        request_params::BarsRequestParams,
    },
    providers::{DataProvider, ProviderError},
};
use chrono::{DateTime, TimeZone, Utc};

type Responder = dyn Fn() -> Result<BarPage, ProviderError> + Send + Sync;

/// Scripted provider that records every call it receives.
pub struct StubProvider {
    calls: AtomicUsize,
    last_params: Mutex<Option<BarsRequestParams>>,
    delay: Option<Duration>,
    respond: Box<Responder>,
}

impl StubProvider {
    pub fn new(
        respond: impl Fn() -> Result<BarPage, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
            delay: None,
            respond: Box::new(respond),
        }
    }

    pub fn returning(bars: Vec<Bar>) -> Self {
        Self::new(move || {
            Ok(BarPage {
                bars: bars.clone(),
                next_page_token: None,
            })
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<BarsRequestParams> {
        self.last_params.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataProvider for StubProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarPage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)()
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn bar(
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
) -> Bar {
    Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
        trade_count: None,
        vwap: None,
    }
}

/// Three daily bars ending on 2025-06-01.
pub fn three_bars() -> Vec<Bar> {
    vec![
        bar(utc(2025, 5, 30, 4), 199.37, 201.96, 196.78, 200.85, 70_819_942),
        bar(utc(2025, 5, 31, 4), 200.85, 203.10, 200.10, 202.50, 51_203_000),
        bar(utc(2025, 6, 1, 4), 202.50, 204.00, 201.00, 203.25, 48_000_123),
    ]
}

pub fn gateway_with(provider: Arc<StubProvider>, now: DateTime<Utc>) -> BarQueryGateway {
    gateway_with_settings(provider, now, GatewaySettings::default())
}

pub fn gateway_with_settings(
    provider: Arc<StubProvider>,
    now: DateTime<Utc>,
    settings: GatewaySettings,
) -> BarQueryGateway {
    BarQueryGateway::new(provider, Arc::new(FixedClock(now)), settings)
}

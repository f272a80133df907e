//! Runtime configuration for the gateway binary.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Upstream credentials are *not* part of this struct;
//! the provider reads them from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`
//! directly so they never end up in a config file.
//!
//! ```toml
//! bind = "0.0.0.0"
//! port = 8080
//! upstream_timeout_ms = 5000
//! feed = "iex"
//! allowed_origins = ["http://localhost:3000"]
//! ```

use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared_utils::env::{InvalidEnvVarError, get_env_var_opt, parse_env_var};
use thiserror::Error;

use crate::{
    gateway::{DEFAULT_MAX_BARS, DEFAULT_UPSTREAM_TIMEOUT, GatewaySettings},
    providers::alpaca_rest::{
        AlpacaSettings,
        params::Feed,
        provider::{DEFAULT_BASE_URL, default_requests_per_minute},
    },
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Env(#[from] InvalidEnvVarError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub upstream_timeout_ms: u64,
    pub max_bars: u32,
    pub feed: Feed,
    pub requests_per_minute: NonZeroU32,
    pub base_url: String,
    pub allowed_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            upstream_timeout_ms: DEFAULT_UPSTREAM_TIMEOUT.as_millis() as u64,
            max_bars: DEFAULT_MAX_BARS,
            feed: Feed::Sip,
            requests_per_minute: default_requests_per_minute(),
            base_url: DEFAULT_BASE_URL.to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl GatewayConfig {
    /// Defaults, overlaid with `path` if given, overlaid with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(bind) = parse_env_var("BAR_GATEWAY_BIND")? {
            self.bind = bind;
        }
        if let Some(port) = parse_env_var("BAR_GATEWAY_PORT")? {
            self.port = port;
        }
        if let Some(ms) = parse_env_var("BAR_GATEWAY_UPSTREAM_TIMEOUT_MS")? {
            self.upstream_timeout_ms = ms;
        }
        if let Some(feed) = parse_env_var("BAR_GATEWAY_FEED")? {
            self.feed = feed;
        }
        if let Some(origins) = get_env_var_opt("BAR_GATEWAY_ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(url) = get_env_var_opt("APCA_DATA_BASE_URL") {
            self.base_url = url;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::Invalid("upstream_timeout_ms must be > 0".into()));
        }
        if self.max_bars == 0 || self.max_bars > DEFAULT_MAX_BARS {
            return Err(ConfigError::Invalid(format!(
                "max_bars must be between 1 and {DEFAULT_MAX_BARS}"
            )));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            upstream_timeout: Duration::from_millis(self.upstream_timeout_ms),
            max_bars: self.max_bars,
            feed: self.feed,
        }
    }

    pub fn alpaca_settings(&self) -> AlpacaSettings {
        AlpacaSettings {
            base_url: self.base_url.clone(),
            requests_per_minute: self.requests_per_minute,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    const ENV_VARS: &[&str] = &[
        "BAR_GATEWAY_BIND",
        "BAR_GATEWAY_PORT",
        "BAR_GATEWAY_UPSTREAM_TIMEOUT_MS",
        "BAR_GATEWAY_FEED",
        "BAR_GATEWAY_ALLOWED_ORIGINS",
        "APCA_DATA_BASE_URL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            unsafe { std::env::remove_var(var) };
        }
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    #[serial]
    fn defaults_without_file_or_env() {
        clear_env();
        let config = GatewayConfig::load(None).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.gateway_settings().upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.gateway_settings().max_bars, 10_000);
    }

    #[test]
    #[serial]
    fn file_values_override_defaults() {
        clear_env();
        let file = write_config(
            r#"
bind = "0.0.0.0"
port = 9000
feed = "iex"
allowed_origins = ["https://charts.example.com"]
"#,
        );
        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.feed, Feed::Iex);
        assert_eq!(config.allowed_origins, vec!["https://charts.example.com"]);
        assert_eq!(config.max_bars, 10_000);
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        clear_env();
        let file = write_config("port = 9000\n");
        unsafe {
            std::env::set_var("BAR_GATEWAY_PORT", "9100");
            std::env::set_var("BAR_GATEWAY_UPSTREAM_TIMEOUT_MS", "1500");
            std::env::set_var("BAR_GATEWAY_ALLOWED_ORIGINS", "http://a.test, http://b.test,");
            std::env::set_var("APCA_DATA_BASE_URL", "http://127.0.0.1:4010");
        }
        let config = GatewayConfig::load(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(config.port, 9100);
        assert_eq!(config.gateway_settings().upstream_timeout, Duration::from_millis(1500));
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.alpaca_settings().base_url, "http://127.0.0.1:4010");
    }

    #[test]
    #[serial]
    fn bad_env_value_is_an_error() {
        clear_env();
        unsafe { std::env::set_var("BAR_GATEWAY_PORT", "http") };
        let err = GatewayConfig::load(None).unwrap_err();
        clear_env();
        assert!(matches!(err, ConfigError::Env(_)), "{err}");
    }

    #[test]
    #[serial]
    fn unknown_keys_are_rejected() {
        clear_env();
        let file = write_config("api_secret = \"hunter2\"\n");
        let err = GatewayConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    #[serial]
    fn invalid_values_are_rejected() {
        clear_env();
        let file = write_config("max_bars = 20000\n");
        assert!(matches!(
            GatewayConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));

        let file = write_config("upstream_timeout_ms = 0\n");
        assert!(matches!(
            GatewayConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));

        let file = write_config("base_url = \"ftp://data.example.com\"\n");
        assert!(matches!(
            GatewayConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = GatewayConfig::from_file(Path::new("/nonexistent/bar_gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

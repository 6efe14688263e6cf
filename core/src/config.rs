//! Client options and the resolved, immutable client configuration.
//!
//! `ClientOptions` is what callers supply; every field is optional so it can
//! be filled from code, JSON, or the environment. `ClientConfig::resolve`
//! overlays it on the defaults and rejects a missing or blank API token.

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://www.twinjet.co/api/v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LIVE: bool = true;

const ENV_PREFIX: &str = "TWINJET";

/// User-supplied client options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientOptions {
    /// Token issued by the courier company; identifies and authenticates you.
    pub api_token: Option<String>,
    /// Overrides the API base URL.
    pub base_url: Option<String>,
    /// Overrides the request timeout, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Whether created jobs should be processed by TwinJet.
    pub live: Option<bool>,
}

impl ClientOptions {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: Some(api_token.into()),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = Some(live);
        self
    }

    /// Read options from `TWINJET_API_TOKEN`, `TWINJET_BASE_URL`,
    /// `TWINJET_TIMEOUT_MS` and `TWINJET_LIVE`. Unset variables stay `None`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(environment.try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| ConfigError::Source(e.to_string()))
    }
}

/// Effective configuration of a client. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_token: String,
    base_url: String,
    timeout_ms: u64,
    live: bool,
}

impl ClientConfig {
    pub fn resolve(options: ClientOptions) -> Result<Self, ConfigError> {
        let api_token = options
            .api_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingApiToken)?;

        let base_url = options
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            timeout_ms: options.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            live: options.live.unwrap_or(DEFAULT_LIVE),
        })
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// The request timeout, or `None` when `timeout_ms` is `0`.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A `TWINJET_` environment backed by `vars` instead of the process env.
    fn environment(vars: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn only_token_resolves_to_defaults() {
        let config = ClientConfig::resolve(ClientOptions::new("tok")).unwrap();
        assert_eq!(config.api_token(), "tok");
        assert_eq!(config.base_url(), "https://www.twinjet.co/api/v1");
        assert_eq!(config.timeout_ms(), 10_000);
        assert!(config.live());
    }

    #[test]
    fn user_values_override_defaults() {
        let options = ClientOptions::new("tok")
            .base_url("http://0.0.0.0/")
            .timeout_ms(250)
            .live(false);
        let config = ClientConfig::resolve(options).unwrap();
        assert_eq!(config.base_url(), "http://0.0.0.0");
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        assert!(!config.live());
    }

    #[test]
    fn missing_token_fails_fast() {
        let err = ClientConfig::resolve(ClientOptions::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiToken);
    }

    #[test]
    fn blank_token_fails_fast() {
        let err = ClientConfig::resolve(ClientOptions::new("   ")).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiToken);
    }

    #[test]
    fn options_deserialize_from_partial_json() {
        let options: ClientOptions =
            serde_json::from_str(r#"{"api_token":"tok","live":false}"#).unwrap();
        assert_eq!(options, ClientOptions::new("tok").live(false));
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let config = ClientConfig::resolve(ClientOptions::new("tok").timeout_ms(0)).unwrap();
        assert_eq!(config.timeout_ms(), 0);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn env_reads_all_keys() {
        let options = ClientOptions::from_environment(environment(&[
            ("TWINJET_API_TOKEN", "tok"),
            ("TWINJET_BASE_URL", "http://localhost:3000"),
            ("TWINJET_TIMEOUT_MS", "500"),
            ("TWINJET_LIVE", "false"),
        ]))
        .unwrap();
        assert_eq!(
            options,
            ClientOptions::new("tok")
                .base_url("http://localhost:3000")
                .timeout_ms(500)
                .live(false)
        );
    }

    #[test]
    fn env_leaves_unset_keys_empty() {
        let options = ClientOptions::from_environment(environment(&[])).unwrap();
        assert_eq!(options, ClientOptions::default());
    }

    #[test]
    fn env_ignores_other_prefixes() {
        let options = ClientOptions::from_environment(environment(&[
            ("TWINJET_API_TOKEN", "tok"),
            ("OTHER_BASE_URL", "http://elsewhere"),
        ]))
        .unwrap();
        assert_eq!(options, ClientOptions::new("tok"));
    }

    #[test]
    fn env_numeric_token_stays_a_string() {
        let options =
            ClientOptions::from_environment(environment(&[("TWINJET_API_TOKEN", "12345")])).unwrap();
        assert_eq!(options.api_token.as_deref(), Some("12345"));
    }

    #[test]
    fn env_rejects_bad_timeout() {
        let err = ClientOptions::from_environment(environment(&[("TWINJET_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Source(_)));
    }

    #[test]
    fn env_rejects_bad_live_flag() {
        let err = ClientOptions::from_environment(environment(&[("TWINJET_LIVE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Source(_)));
    }
}

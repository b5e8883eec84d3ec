//! Process-wide client configuration.
//!
//! Resolved once, from the environment or a TOML document, and handed to
//! `ApiClient::new`. Nothing reads configuration after that point.
//!
//! ```toml
//! secret_key = "sk_test_xxx"
//! base_url = "https://api.paystack.co"
//! timeout_secs = 3
//! retry = 3
//!
//! [headers]
//! x-request-source = "billing"
//! ```

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
pub const DEFAULT_APP_NAME: &str = "BilmaPay";

/// Bearer secret. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub secret_key: SecretKey,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Prefix for human-readable transfer reasons.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Connect timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first failed attempt.
    #[serde(default = "default_retry")]
    pub retry: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// When false, POST and PATCH are only retried if the request provably
    /// never left the machine.
    #[serde(default = "default_retry_non_idempotent")]
    pub retry_non_idempotent: bool,

    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Config {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretKey::new(secret_key),
            base_url: default_base_url(),
            app_name: default_app_name(),
            timeout_secs: default_timeout_secs(),
            retry: default_retry(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_non_idempotent: default_retry_non_idempotent(),
            headers: BTreeMap::new(),
        }
    }

    /// Read the `PAYSTACK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let secret = read("PAYSTACK_SECRET").ok_or(ConfigError::MissingSecret)?;
        let mut config = Config::new(secret);

        if let Some(base_url) = read("PAYSTACK_ENDPOINT") {
            config.base_url = base_url;
        }
        if let Some(app_name) = read("PAYSTACK_APP_NAME") {
            config.app_name = app_name;
        }
        if let Some(value) = read("PAYSTACK_TIMEOUT") {
            config.timeout_secs = parse_number("PAYSTACK_TIMEOUT", &value)?;
        }
        if let Some(value) = read("PAYSTACK_RETRY") {
            config.retry = parse_number("PAYSTACK_RETRY", &value)?;
        }
        if let Some(value) = read("PAYSTACK_RETRY_DELAY_MS") {
            config.retry_delay_ms = parse_number("PAYSTACK_RETRY_DELAY_MS", &value)?;
        }
        if let Some(value) = read("PAYSTACK_RETRY_NON_IDEMPOTENT") {
            config.retry_non_idempotent = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "PAYSTACK_RETRY_NON_IDEMPOTENT",
                        value,
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that values are usable before any request is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                key: "base_url",
                value: self.base_url.clone(),
            });
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ConfigError::OutOfRange(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.retry > 10 {
            return Err(ConfigError::OutOfRange("retry must be at most 10".to_owned()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retry,
            delay: Duration::from_millis(self.retry_delay_ms),
            retry_non_idempotent: self.retry_non_idempotent,
        }
    }
}

fn parse_number<N: std::str::FromStr>(key: &'static str, value: &str) -> Result<N, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_owned(),
    })
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_owned()
}

fn default_timeout_secs() -> u64 {
    3
}

fn default_retry() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_retry_non_idempotent() -> bool {
    true
}

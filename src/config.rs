//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! resolver and Telegram delivery constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings loaded from config files and environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Public bot username (without `@`), shown in user guidance
    pub bot_username: Option<String>,

    /// Address the HTTP server binds to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Substring every submitted link must contain
    #[serde(default = "default_hosting_domain")]
    pub hosting_domain: String,

    /// Endpoint template of the result-list resolver API (`{url}` placeholder)
    #[serde(default = "default_result_list_api_url")]
    pub result_list_api_url: String,
    /// Endpoint template of the status-envelope resolver API (`{url}` placeholder)
    #[serde(default = "default_status_envelope_api_url")]
    pub status_envelope_api_url: String,
    /// Optional endpoint template of a flat-response resolver API
    pub flat_api_url: Option<String>,

    /// Timeout of a single resolver attempt, seconds
    #[serde(default = "default_resolver_timeout_secs")]
    pub resolver_timeout_secs: u64,
    /// Timeout of the file size probe, seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Browser identification sent with every upstream request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_hosting_domain() -> String {
    MEDIAFIRE_DOMAIN.to_string()
}

fn default_result_list_api_url() -> String {
    RESULT_LIST_API_URL.to_string()
}

fn default_status_envelope_api_url() -> String {
    STATUS_ENVELOPE_API_URL.to_string()
}

const fn default_resolver_timeout_secs() -> u64 {
    RESOLVER_TIMEOUT_SECS
}

const fn default_probe_timeout_secs() -> u64 {
    PROBE_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediafire_relay::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `TELEGRAM_TOKEN` is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__PORT=8080 ./target/app` would set the `port` key
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables, empty values treated as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Per-attempt resolver timeout
    #[must_use]
    pub const fn resolver_timeout(&self) -> Duration {
        Duration::from_secs(self.resolver_timeout_secs)
    }

    /// Size probe timeout
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Socket address string for the HTTP listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Hosting domain accepted by default
pub const MEDIAFIRE_DOMAIN: &str = "mediafire.com";

// Resolver configuration
/// Result-list resolver API (`{ result: [ { nama, link } ] }`)
pub const RESULT_LIST_API_URL: &str = "https://api.vreden.web.id/api/mediafiredl?url={url}";
/// Status-envelope resolver API (`{ status, data: { fileName, downloadLink } }`)
pub const STATUS_ENVELOPE_API_URL: &str = "https://api.siputzx.my.id/api/d/mediafire?url={url}";
/// Timeout of one resolver attempt in seconds
pub const RESOLVER_TIMEOUT_SECS: u64 = 15;
/// Timeout of the HEAD size probe in seconds
pub const PROBE_TIMEOUT_SECS: u64 = 8;
/// Desktop browser identification for upstream requests
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// Telegram delivery configuration
/// Initial backoff for Telegram send retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff for Telegram send retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Retries after the first failed Telegram send
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

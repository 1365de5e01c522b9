//! Gateway configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IRC connection
    pub irc: IrcConfig,

    /// SMS provider credentials
    pub twilio: TwilioConfig,

    /// Webhook HTTP server
    #[serde(default)]
    pub http: HttpConfig,

    /// User store
    #[serde(default)]
    pub store: StoreConfig,

    /// Media re-hosting
    pub media: MediaConfig,

    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    pub host: String,

    #[serde(default = "default_irc_port")]
    pub port: u16,

    pub nick: String,

    /// The one channel the bot joins and bridges.
    pub channel: String,

    /// Optional services greeting sent right after registration.
    #[serde(default)]
    pub login_message: Option<String>,

    /// Where the greeting goes.
    #[serde(default = "default_login_target")]
    pub login_target: String,

    #[serde(default = "default_true")]
    pub verify_tls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,

    /// The gateway's own number; the sender of every outbound SMS.
    pub phone_number: String,

    /// Public URL the provider was told to deliver webhooks to. Part of
    /// the signature input, so it must match exactly.
    pub callback_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the user record file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Region used to parse phone numbers without a leading `+`.
    #[serde(default = "default_region")]
    pub default_region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// S3-compatible endpoint, including scheme.
    #[serde(default = "default_s3_endpoint")]
    pub s3_endpoint: String,

    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,

    /// Prefix for re-hosted object names.
    #[serde(default)]
    pub bucket_prefix: String,

    /// Fixed delay between provider media deletion attempts when the
    /// provider is rate limiting us.
    #[serde(default = "default_delete_retry_delay", with = "humantime_serde")]
    pub delete_retry_delay: Duration,

    /// Upper bound on rate-limited deletion attempts. Unset means retry
    /// forever, matching the provider's own guidance.
    #[serde(default)]
    pub delete_max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_http_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            default_region: default_region(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_irc_port() -> u16 {
    6697
}

fn default_login_target() -> String {
    "Userserv".into()
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".into()
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_http_port() -> u16 {
    8080
}

fn default_store_path() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_region() -> String {
    "US".into()
}

fn default_s3_endpoint() -> String {
    "https://s3.amazonaws.com".into()
}

fn default_delete_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Note: try_parsing(true) would parse +14155550123 as a
                    // positive number, stripping the + prefix. Keep strings
                    // as strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

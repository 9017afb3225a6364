//! Extractor - Configuration
//!
//! JSON-based configuration loading with sensible defaults.
//! A minimal config only needs a subject and one metric definition.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use extractor_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     r#"{"subject": "metrics.raw",
//!         "metrics": [{"name": "hits", "fields": [{"position": 0}]}]}"#,
//! )
//! .unwrap();
//! assert_eq!(config.metrics.len(), 1);
//! ```
//!
//! # Example Full Config
//!
//! ```json
//! {
//!   "bus_conf":   { "servers": ["nats://localhost:4222"] },
//!   "log_conf":   { "level": "info", "format": "console" },
//!   "retry_sec":  5,
//!   "subject":    "metrics.raw",
//!   "dims":       { "role": "edge" },
//!   "metrics":    [
//!     {
//!       "name": "api.requests",
//!       "fields": [
//!         { "position": 0, "type": "timestamp" },
//!         { "position": 1, "type": "number", "label": "status" }
//!       ],
//!       "timestamp_field": 0,
//!       "timestamp_format": "msec"
//!     }
//!   ],
//!   "stats_conf": { "report_sec": 60, "subject": "metrics.stats", "prefix": "extractor" }
//! }
//! ```

mod error;
mod fields;
mod logging;
mod metric;
mod validation;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use fields::{FieldDef, FieldType};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metric::{MetricDef, MungeDef};

/// Default seconds between retries while waiting for the tailed file
pub const DEFAULT_RETRY_SEC: u64 = 5;

fn default_retry_sec() -> u64 {
    DEFAULT_RETRY_SEC
}

fn default_report_sec() -> u64 {
    60
}

/// Main configuration structure
///
/// All sections except `metrics` are optional. `bus_conf` absent means the
/// sink runs in trace mode and emitted metrics are logged instead of
/// published.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Message bus connection; absent selects trace mode
    #[serde(rename = "bus_conf")]
    pub bus: Option<BusConfig>,

    /// Logging configuration
    #[serde(rename = "log_conf")]
    pub log: LogConfig,

    /// Seconds between retries while waiting for the tailed file to appear
    #[serde(default = "default_retry_sec")]
    pub retry_sec: u64,

    /// Subject metric events are published on
    pub subject: String,

    /// Dimensions attached to every emitted metric
    pub dims: BTreeMap<String, serde_json::Value>,

    /// Metrics to extract, one emission attempt per line each
    pub metrics: Vec<MetricDef>,

    /// Periodic stats reporting; absent disables the reporter
    #[serde(rename = "stats_conf")]
    pub stats: Option<StatsConfig>,
}

/// Message bus connection settings
///
/// Servers are NATS URLs; use a `tls://` scheme for TLS connections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus server URLs, tried in order
    pub servers: Vec<String>,
}

/// Stats reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Seconds between reports; 0 disables the reporter
    #[serde(default = "default_report_sec")]
    pub report_sec: u64,

    /// Subject stats gauges are published on; empty falls back to the
    /// main subject
    pub subject: String,

    /// Prefix prepended to each stat key as `{prefix}.{key}`
    pub prefix: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            report_sec: default_report_sec(),
            subject: String::new(),
            prefix: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    /// Validation is separate; call [`Config::validate`] once overrides have
    /// been applied.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Validate the configuration
    ///
    /// Checks that at least one metric is configured, every metric has a
    /// name, and selector positions (`value_field`, `timestamp_field`,
    /// `munge.field_number`) refer to a declared field. A metric whose
    /// selector names an undeclared position could never emit, so it is
    /// rejected at startup rather than failing every line at runtime.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s)?;
        Ok(config)
    }
}

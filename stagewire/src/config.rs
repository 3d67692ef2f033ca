//! Runtime configuration.
//!
//! Settings come from environment variables with serde-friendly defaults:
//!
//! | Variable               | Default | Meaning                              |
//! |------------------------|---------|--------------------------------------|
//! | `MODE`                 | `dev`   | `dev`, `staging` or `prod`           |
//! | `REPORT_INTERVAL_SECS` | `60`    | metrics export period                |
//! | `LATENCY_CAPACITY`     | `1000`  | latency samples kept per stage key   |
//! | `LOG_JSON`             | mode    | JSON logs (default on in `prod`)     |

use crate::errors::ConfigError;
use crate::monitor::DEFAULT_LATENCY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local development.
    #[default]
    Dev,
    /// Pre-production.
    Staging,
    /// Production.
    Prod,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Staging => write!(f, "staging"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "staging" => Ok(Self::Staging),
            "prod" => Ok(Self::Prod),
            _ => Err(ConfigError::new(
                "MODE",
                s,
                "expected one of dev, staging, prod",
            )),
        }
    }
}

/// Process settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Deployment mode.
    #[serde(default)]
    pub mode: Mode,
    /// How often metrics are exported and reset.
    #[serde(default = "default_report_interval")]
    pub report_interval: Duration,
    /// Latency samples retained per stage key.
    #[serde(default = "default_latency_capacity")]
    pub latency_capacity: usize,
    /// Whether logs are emitted as JSON.
    #[serde(default)]
    pub log_json: bool,
}

fn default_report_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_latency_capacity() -> usize {
    DEFAULT_LATENCY_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            report_interval: default_report_interval(),
            latency_capacity: default_latency_capacity(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("MODE") {
            Some(raw) => raw.parse()?,
            None => Mode::default(),
        };

        let report_interval = match lookup("REPORT_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ConfigError::new("REPORT_INTERVAL_SECS", &raw, "expected whole seconds")
                })?;
                if secs == 0 {
                    return Err(ConfigError::new(
                        "REPORT_INTERVAL_SECS",
                        raw,
                        "must be greater than zero",
                    ));
                }
                Duration::from_secs(secs)
            }
            None => default_report_interval(),
        };

        let latency_capacity = match lookup("LATENCY_CAPACITY") {
            Some(raw) => {
                let capacity: usize = raw.trim().parse().map_err(|_| {
                    ConfigError::new("LATENCY_CAPACITY", &raw, "expected a positive integer")
                })?;
                if capacity == 0 {
                    return Err(ConfigError::new(
                        "LATENCY_CAPACITY",
                        raw,
                        "must be greater than zero",
                    ));
                }
                capacity
            }
            None => default_latency_capacity(),
        };

        let log_json = match lookup("LOG_JSON") {
            Some(raw) => parse_bool("LOG_JSON", &raw)?,
            None => mode == Mode::Prod,
        };

        Ok(Self {
            mode,
            report_interval,
            latency_capacity,
            log_json,
        })
    }

    /// Sets the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the report interval.
    #[must_use]
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Sets the latency capacity.
    #[must_use]
    pub fn with_latency_capacity(mut self, capacity: usize) -> Self {
        self.latency_capacity = capacity;
        self
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::new(key, raw, "expected a boolean")),
    }
}

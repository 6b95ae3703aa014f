//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CALL_AGENT__<SECTION>__<KEY>` environment variables. The loaded value is
//! immutable and converted into the runtime configs handed to each component.

use crate::resilience::{CircuitBreakerConfig, HealthMonitorConfig, RetryPolicy};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the guarded dependency
    pub service_name: String,
    pub retry: RetrySettings,
    pub circuit_breaker: CircuitBreakerSettings,
    pub health: HealthSettings,
    pub alerts: AlertSettings,
    pub logging: LoggingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "ElevenLabs".to_string(),
            retry: RetrySettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            health: HealthSettings::default(),
            alerts: AlertSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 5_000,
            backoff_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            recovery_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub interval_secs: u64,
    pub max_downtime_secs: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            max_downtime_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub email_enabled: bool,
    pub telegram_enabled: bool,
    pub webhook_enabled: bool,
    /// Endpoint for webhook alerts; without it webhook alerts are only logged
    pub webhook_url: Option<String>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            email_enabled: false,
            telegram_enabled: false,
            webhook_enabled: true,
            webhook_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit `tracing` output as JSON
    pub json: bool,
    /// JSON lines audit log
    pub log_file: Option<PathBuf>,
    /// Spreadsheet-style CSV audit log
    pub csv_file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_file: Some(PathBuf::from("logs/app.log")),
            csv_file: Some(PathBuf::from("logs/calls.csv")),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CALL_AGENT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the components cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(invalid("service_name", "must not be empty"));
        }

        let factor = self.retry.backoff_factor;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(invalid(
                "retry.backoff_factor",
                format!("must be a positive number, got {factor}"),
            ));
        }

        if self.circuit_breaker.failure_threshold == 0 {
            return Err(invalid(
                "circuit_breaker.failure_threshold",
                "must be at least 1",
            ));
        }

        if self.health.interval_secs == 0 {
            return Err(invalid("health.interval_secs", "must be at least 1"));
        }

        if let Some(raw) = &self.alerts.webhook_url {
            url::Url::parse(raw).map_err(|e| invalid("alerts.webhook_url", e.to_string()))?;
        }

        Ok(())
    }

    /// Legal settings that still deserve a warning at startup
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let factor = self.retry.backoff_factor;
        if factor <= 1.0 {
            warnings.push(format!(
                "retry.backoff_factor = {factor} gives a constant or shrinking retry delay"
            ));
        }
        warnings
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            backoff_factor: self.retry.backoff_factor,
        }
    }

    #[must_use]
    pub const fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_breaker.failure_threshold,
            recovery_timeout: Duration::from_secs(self.circuit_breaker.recovery_timeout_secs),
        }
    }

    #[must_use]
    pub const fn health_monitor_config(&self) -> HealthMonitorConfig {
        HealthMonitorConfig {
            interval: Duration::from_secs(self.health.interval_secs),
            max_downtime_before_alert: Duration::from_secs(self.health.max_downtime_secs),
        }
    }
}

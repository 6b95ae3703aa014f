use super::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::ports::{AuditEvent, EventSinks, HealthProbe, LogLevel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};

/// Alert raised when the dependency stays down with the circuit open
pub const SUSTAINED_OUTAGE_ALERT: &str = "Service remains down beyond acceptable threshold";

/// Health monitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthMonitorConfig {
    /// Time between health samples
    pub interval: Duration,
    /// Minimum spacing between two sustained-outage alerts
    pub max_downtime_before_alert: Duration,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_downtime_before_alert: Duration::from_secs(30),
        }
    }
}

/// What a single health sample led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Dependency healthy, circuit already closed
    Healthy,
    /// Dependency healthy, circuit was force-closed
    Recovered,
    /// Dependency unhealthy but the circuit has not opened yet
    Degraded,
    /// Dependency unhealthy with the circuit open; alert raised
    OutageAlerted,
    /// Dependency unhealthy with the circuit open; alert rate-limited
    OutageAlertSuppressed,
}

/// Background reconciler between the dependency's health flag and the
/// circuit breaker.
///
/// Closes the circuit early once the dependency reports healthy again, and
/// raises a sustained-outage alert at most once per
/// `max_downtime_before_alert` while the circuit stays open.
pub struct HealthMonitor {
    service_name: String,
    probe: Arc<dyn HealthProbe>,
    breaker: Arc<CircuitBreaker>,
    config: HealthMonitorConfig,
    sinks: EventSinks,
    last_alert_time: Option<Instant>,
}

impl HealthMonitor {
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        breaker: Arc<CircuitBreaker>,
        config: HealthMonitorConfig,
        sinks: EventSinks,
    ) -> Self {
        Self {
            service_name: breaker.name().to_string(),
            probe,
            breaker,
            config,
            sinks,
            last_alert_time: None,
        }
    }

    /// Sample the dependency once and reconcile the breaker
    pub async fn tick(&mut self) -> TickOutcome {
        let healthy = self.probe.is_healthy().await;
        let state = self.breaker.state().await;

        if healthy {
            if state == CircuitState::Closed {
                return TickOutcome::Healthy;
            }

            self.breaker.record_success().await;
            info!(
                "Health monitor for '{}': dependency recovered, circuit reset",
                self.service_name
            );
            self.sinks.record(
                AuditEvent::new(
                    LogLevel::Info,
                    &self.service_name,
                    "Health monitor detected recovery",
                )
                .with_circuit_state(CircuitState::Closed),
            );
            return TickOutcome::Recovered;
        }

        match state {
            CircuitState::Closed | CircuitState::HalfOpen => TickOutcome::Degraded,
            CircuitState::Open => self.escalate_outage().await,
        }
    }

    async fn escalate_outage(&mut self) -> TickOutcome {
        let now = Instant::now();
        let due = self.last_alert_time.map_or(true, |at| {
            now.duration_since(at) > self.config.max_downtime_before_alert
        });

        if !due {
            debug!(
                "Health monitor for '{}': outage alert suppressed",
                self.service_name
            );
            return TickOutcome::OutageAlertSuppressed;
        }

        self.sinks
            .notify(&self.service_name, SUSTAINED_OUTAGE_ALERT)
            .await;
        error!(
            "Health monitor for '{}': downtime exceeded {:?}",
            self.service_name, self.config.max_downtime_before_alert
        );
        self.sinks.record(
            AuditEvent::new(
                LogLevel::Critical,
                &self.service_name,
                "Dependency downtime exceeded threshold",
            )
            .with_circuit_state(CircuitState::Open),
        );
        self.last_alert_time = Some(now);
        TickOutcome::OutageAlerted
    }

    /// Tick every `interval` until `shutdown` turns true or its sender drops.
    /// The wait between ticks is interrupted by shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Health monitor for '{}' started (interval {:?})",
            self.service_name, self.config.interval
        );

        while !*shutdown.borrow() {
            tokio::select! {
                () = sleep(self.config.interval) => {
                    let outcome = self.tick().await;
                    debug!("Health monitor for '{}': {:?}", self.service_name, outcome);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Health monitor for '{}' shutting down", self.service_name);
    }

    /// Run the monitor as a background task
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("service_name", &self.service_name)
            .field("config", &self.config)
            .field("last_alert_time", &self.last_alert_time)
            .finish_non_exhaustive()
    }
}

pub mod circuit_breaker;
pub mod health;
pub mod retry;


pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState, CIRCUIT_OPEN_ALERT,
};
pub use health::{HealthMonitor, HealthMonitorConfig, TickOutcome, SUSTAINED_OUTAGE_ALERT};
pub use retry::{RetryExecutor, RetryPolicy};

use anyhow::{bail, Context};
use clap::Parser;
use resilient_call_agent::adapters::FailureKind;
use resilient_call_agent::service::build_event_sinks;
use resilient_call_agent::{
    CallProcessor, CallQueue, CircuitBreaker, Config, HealthMonitor, MockTtsService,
    RetryExecutor, SignalHandler,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Process a queue of calls against a flaky speech service with retry,
/// circuit breaking and background health recovery
#[derive(Parser, Debug)]
#[command(name = "resilient-call-agent", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Name of the guarded service
    #[arg(long)]
    service: Option<String>,

    /// Contact to call; repeat for several
    #[arg(long = "contact", value_name = "LABEL")]
    contacts: Vec<String>,

    /// Clear the mock service's fail mode after this many seconds
    #[arg(long)]
    recover_after_secs: Option<u64>,

    /// Always fail with this error while the mock is failing
    #[arg(long, value_enum)]
    force_error: Option<FailureKind>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(service) = cli.service {
        config.service_name = service;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_tracing(&config.logging.level, config.logging.json);
    info!("resilient-call-agent v{} starting", env!("CARGO_PKG_VERSION"));
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    let sinks = build_event_sinks(&config).context("failed to open audit sinks")?;

    let service = Arc::new(
        MockTtsService::new(config.service_name.clone()).with_forced_error(cli.force_error),
    );
    let breaker = Arc::new(CircuitBreaker::new(
        config.service_name.clone(),
        config.circuit_breaker_config(),
        sinks.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signals = SignalHandler::install(shutdown_tx.clone())
        .context("failed to install signal handlers")?;

    let monitor = HealthMonitor::new(
        service.clone(),
        breaker.clone(),
        config.health_monitor_config(),
        sinks.clone(),
    )
    .spawn(shutdown_rx.clone());

    if let Some(secs) = cli.recover_after_secs {
        let service = service.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            service.set_fail_mode(false);
            info!("Simulated recovery: mock service is healthy again");
        });
    }

    let contacts = if cli.contacts.is_empty() {
        (1..=4).map(|n| format!("Contact-{n}")).collect()
    } else {
        cli.contacts
    };
    let mut queue = CallQueue::new(contacts, sinks.audit.clone());

    let processor = CallProcessor::new(
        service,
        breaker,
        RetryExecutor::new(config.retry_policy(), sinks.clone()),
        sinks,
    );

    let mut interrupted = shutdown_rx.clone();
    let summary = tokio::select! {
        summary = processor.run(&mut queue) => Some(summary),
        _ = interrupted.wait_for(|stop| *stop) => None,
    };

    let _ = shutdown_tx.send(true);
    monitor.await.context("health monitor task failed")?;
    signals.close().await;

    let Some(summary) = summary else {
        warn!("Interrupted with {} call(s) still queued", queue.len());
        return Ok(());
    };

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        skipped = summary.skipped.len(),
        "Run finished"
    );

    if let Some((item, error)) = summary.halted {
        bail!("run halted at {item}: {error}");
    }
    Ok(())
}

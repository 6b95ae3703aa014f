use resilient_call_agent::Config;
use std::time::Duration;
use tempfile::TempDir;

// Environment variables are process-wide, so this is the only test in the binary.
#[test]
fn test_environment_overrides_file_and_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.toml");
    std::fs::write(&path, "[health]\nmax_downtime_secs = 45\ninterval_secs = 5\n").unwrap();

    std::env::set_var("CALL_AGENT__HEALTH__MAX_DOWNTIME_SECS", "90");
    std::env::set_var("CALL_AGENT__ALERTS__EMAIL_ENABLED", "true");
    let loaded = Config::load(Some(&path));
    std::env::remove_var("CALL_AGENT__HEALTH__MAX_DOWNTIME_SECS");
    std::env::remove_var("CALL_AGENT__ALERTS__EMAIL_ENABLED");

    let config = loaded.unwrap();
    assert_eq!(config.health.max_downtime_secs, 90);
    assert_eq!(config.health.interval_secs, 5);
    assert!(config.alerts.email_enabled);

    let health = config.health_monitor_config();
    assert_eq!(health.interval, Duration::from_secs(5));
    assert_eq!(health.max_downtime_before_alert, Duration::from_secs(90));
}

use crate::config::AlertSettings;
use crate::ports::{AlertSink, AuditEvent, AuditSink, LogLevel};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Alert sink that only writes a warning through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&self, service: &str, message: &str) {
        warn!(target: "resilient_call_agent::alerts", service = %service, "{}", message);
    }
}

/// Unified alert dispatcher.
///
/// Every alert is recorded as a critical audit event, then handed to each
/// enabled channel. Email and Telegram are simulated; the webhook channel
/// POSTs JSON when a URL is configured. Channel failures are logged and
/// otherwise ignored.
pub struct AlertManager {
    email_enabled: bool,
    telegram_enabled: bool,
    webhook_enabled: bool,
    webhook_url: Option<Url>,
    client: reqwest::Client,
    audit: Arc<dyn AuditSink>,
}

impl AlertManager {
    pub fn new(config: &AlertSettings, audit: Arc<dyn AuditSink>) -> Result<Self> {
        let webhook_url = match config.webhook_url.as_deref() {
            Some(raw) => Some(Url::parse(raw).map_err(|e| crate::Error::InvalidConfig {
                field: "alerts.webhook_url".to_string(),
                reason: e.to_string(),
            })?),
            None => None,
        };
        let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;

        Ok(Self {
            email_enabled: config.email_enabled,
            telegram_enabled: config.telegram_enabled,
            webhook_enabled: config.webhook_enabled,
            webhook_url,
            client,
            audit,
        })
    }

    async fn send_webhook(&self, url: &Url, service: &str, message: &str) -> Result<()> {
        let payload = serde_json::json!({
            "alert_id": Uuid::new_v4().to_string(),
            "service": service,
            "message": message,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let response = self
            .client
            .post(url.clone())
            .json(&payload)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl AlertSink for AlertManager {
    async fn notify(&self, service: &str, message: &str) {
        self.audit.record(&AuditEvent::new(
            LogLevel::Critical,
            service,
            format!("ALERT TRIGGERED: {message}"),
        ));

        if self.email_enabled {
            info!(target: "resilient_call_agent::alerts", "Email alert sent for {}: {}", service, message);
        }

        if self.telegram_enabled {
            info!(target: "resilient_call_agent::alerts", "Telegram alert sent for {}: {}", service, message);
        }

        if self.webhook_enabled {
            match &self.webhook_url {
                Some(url) => match self.send_webhook(url, service, message).await {
                    Ok(()) => debug!("Webhook alert delivered to {}", url),
                    Err(e) => warn!("Webhook alert to {} failed: {}", url, e),
                },
                None => {
                    info!(target: "resilient_call_agent::alerts", "Webhook alert for {}: {}", service, message);
                }
            }
        }
    }
}

impl std::fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager")
            .field("email_enabled", &self.email_enabled)
            .field("telegram_enabled", &self.telegram_enabled)
            .field("webhook_enabled", &self.webhook_enabled)
            .field("webhook_url", &self.webhook_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::RecordingAuditSink;

    #[tokio::test]
    async fn test_alert_is_audited_as_critical() {
        let audit = Arc::new(RecordingAuditSink::new());
        let config = AlertSettings {
            email_enabled: true,
            telegram_enabled: true,
            webhook_enabled: true,
            webhook_url: None,
        };
        let manager = AlertManager::new(&config, audit.clone()).unwrap();

        manager.notify("ElevenLabs", "Permanent failure detected").await;

        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, LogLevel::Critical);
        assert_eq!(events[0].service, "ElevenLabs");
        assert_eq!(
            events[0].message,
            "ALERT TRIGGERED: Permanent failure detected"
        );
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_swallowed() {
        let audit = Arc::new(RecordingAuditSink::new());
        let config = AlertSettings {
            webhook_enabled: true,
            webhook_url: Some("http://127.0.0.1:9/alerts".to_string()),
            ..AlertSettings::default()
        };
        let manager = AlertManager::new(&config, audit.clone()).unwrap();

        manager.notify("svc", "down").await;
        assert_eq!(audit.events().len(), 1);
    }

    #[test]
    fn test_invalid_webhook_url_rejected() {
        let config = AlertSettings {
            webhook_url: Some("not a url".to_string()),
            ..AlertSettings::default()
        };
        let result = AlertManager::new(&config, Arc::new(RecordingAuditSink::new()));
        assert!(matches!(
            result,
            Err(crate::Error::InvalidConfig { field, .. }) if field == "alerts.webhook_url"
        ));
    }
}

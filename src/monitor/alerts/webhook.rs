// Generic Webhook Alert Channel

use crate::monitor::alerts::channels::{http_client, validate_endpoint};
use crate::monitor::alerts::{Alert, AlertChannel};
use crate::monitor::config::WebhookConfig;
use crate::{MonitorError, Result};
use async_trait::async_trait;
use serde_json::json;

/// Posts each alert as a JSON document to a configured URL
pub struct WebhookChannel {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        validate_endpoint("webhook", &config.url)?;
        Ok(Self {
            config,
            client: http_client()?,
        })
    }

    fn format_payload(&self, alert: &Alert) -> serde_json::Value {
        json!({
            "source": "certmonitor",
            "version": "1.0",
            "alert": {
                "site": alert.site_name,
                "address": alert.address,
                "severity": alert.severity.to_string(),
                "message": alert.message,
                "timestamp": alert.timestamp.to_rfc3339(),
                "type": alert.alert_type.label(),
                "certificate_subject": alert.certificate_subject,
                "alert_type_data": alert.alert_type
            }
        })
    }

    async fn post(&self, payload: &serde_json::Value) -> Result<reqwest::Response> {
        let mut request = self.client.post(&self.config.url).json(payload);

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        Ok(request.send().await?)
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    async fn send_alert(&self, alert: &Alert) -> Result<()> {
        let response = self.post(&self.format_payload(alert)).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Alert {
                channel: "webhook".to_string(),
                details: format!("status {}: {}", status, body),
            });
        }

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

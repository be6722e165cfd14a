// Slack Alert Channel - Incoming webhook integration

use crate::monitor::alerts::channels::{http_client, validate_endpoint};
use crate::monitor::alerts::{Alert, AlertChannel, AlertType};
use crate::monitor::config::SlackConfig;
use crate::monitor::evaluator::{EXPIRY_TIME_FORMAT, Severity};
use crate::{MonitorError, Result};
use async_trait::async_trait;
use chrono::Local;
use serde_json::json;

/// Slack alert channel
pub struct SlackChannel {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(config: SlackConfig) -> Result<Self> {
        validate_endpoint("slack", &config.webhook_url)?;
        Ok(Self {
            config,
            client: http_client()?,
        })
    }

    /// Format alert as a Slack attachment message
    fn format_message(&self, alert: &Alert) -> serde_json::Value {
        let (color, emoji) = match alert.severity {
            Severity::Critical => ("#dc3545", ":rotating_light:"),
            Severity::Warning => ("#ffc107", ":warning:"),
            Severity::Info => ("#6c757d", ":information_source:"),
        };

        let mut fields = vec![
            json!({
                "title": "Site",
                "value": format!("{} ({})", alert.site_name, alert.address),
                "short": true
            }),
            json!({
                "title": "Severity",
                "value": alert.severity.to_string().to_uppercase(),
                "short": true
            }),
        ];

        match &alert.alert_type {
            AlertType::CertificateExpired { not_after } => {
                fields.push(json!({
                    "title": "Expired At",
                    "value": not_after.with_timezone(&Local).format(EXPIRY_TIME_FORMAT).to_string(),
                    "short": true
                }));
            }
            AlertType::CertificateExpiring {
                not_after,
                remaining_hours,
            } => {
                fields.push(json!({
                    "title": "Expires At",
                    "value": not_after.with_timezone(&Local).format(EXPIRY_TIME_FORMAT).to_string(),
                    "short": true
                }));
                fields.push(json!({
                    "title": "Remaining",
                    "value": format!("{:.1} hours", remaining_hours),
                    "short": true
                }));
            }
            AlertType::Test => {}
        }

        if let Some(ref subject) = alert.certificate_subject {
            fields.push(json!({
                "title": "Certificate",
                "value": subject,
                "short": true
            }));
        }

        json!({
            "username": "Certificate Monitor",
            "icon_emoji": emoji,
            "attachments": [
                {
                    "color": color,
                    "title": format!("{} Alert", alert.severity.to_string().to_uppercase()),
                    "text": alert.message,
                    "fields": fields,
                    "footer": "certmonitor",
                    "ts": alert.timestamp.timestamp()
                }
            ]
        })
    }

    async fn post(&self, message: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Alert {
                channel: "slack".to_string(),
                details: format!("status {}: {}", status, body),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl AlertChannel for SlackChannel {
    async fn send_alert(&self, alert: &Alert) -> Result<()> {
        self.post(&self.format_message(alert)).await
    }

    fn channel_name(&self) -> &str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::evaluator::{Finding, FindingKind};
    use chrono::Utc;

    fn create_test_config() -> SlackConfig {
        SlackConfig {
            enabled: true,
            webhook_url: "https://hooks.slack.com/services/TEST/WEBHOOK/URL".to_string(),
        }
    }

    #[test]
    fn test_slack_channel_new() {
        let channel = SlackChannel::new(create_test_config()).unwrap();
        assert_eq!(channel.channel_name(), "slack");
    }

    #[test]
    fn test_format_expiring_message() {
        let channel = SlackChannel::new(create_test_config()).unwrap();
        let now = Utc::now();
        let alert = Alert::from_finding(&Finding {
            site_name: "bleem".to_string(),
            address: "https://mritd.com".to_string(),
            kind: FindingKind::ExpiringSoon {
                not_after: now + chrono::Duration::hours(48),
                remaining_hours: 48.0,
            },
            severity: Severity::Warning,
            message: "Website [bleem](https://mritd.com) certificate will expire, remaining time: 48.000000h"
                .to_string(),
            certificate_subject: "mritd.com".to_string(),
            detected_at: now,
        });

        let message = channel.format_message(&alert);
        let attachment = &message["attachments"][0];

        assert_eq!(attachment["color"], "#ffc107");
        assert!(attachment["title"].as_str().unwrap().contains("WARNING"));
        assert!(attachment["text"].as_str().unwrap().contains("mritd.com"));

        let fields = attachment["fields"].as_array().unwrap();
        assert!(fields.iter().any(|f| f["title"] == "Remaining" && f["value"] == "48.0 hours"));
        assert!(fields.iter().any(|f| f["title"] == "Certificate"));
    }

    #[test]
    fn test_format_test_message() {
        let channel = SlackChannel::new(create_test_config()).unwrap();
        let message = channel.format_message(&Alert::test());

        let fields = message["attachments"][0]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(message["icon_emoji"], ":information_source:");
    }
}

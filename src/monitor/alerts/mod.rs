// Alert System - Deliver findings to external channels

pub mod channels;
pub mod slack;
pub mod webhook;

use crate::monitor::config::MonitorConfig;
use crate::monitor::evaluator::{Finding, FindingKind, Severity};
use crate::{MonitorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use channels::AlertChannel;

/// Receiver of findings produced by a monitoring pass
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one finding. Failures are reported to the caller, never retried here.
    async fn notify(&self, finding: &Finding) -> Result<()>;
}

/// Notifier that hands each finding to a closure
pub struct CallbackNotifier<F> {
    callback: F,
}

impl<F> CallbackNotifier<F>
where
    F: Fn(&Finding) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F> Notifier for CallbackNotifier<F>
where
    F: Fn(&Finding) + Send + Sync,
{
    async fn notify(&self, finding: &Finding) -> Result<()> {
        (self.callback)(finding);
        Ok(())
    }
}

/// Alert type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertType {
    CertificateExpired {
        not_after: DateTime<Utc>,
    },
    CertificateExpiring {
        not_after: DateTime<Utc>,
        remaining_hours: f64,
    },
    Test,
}

impl AlertType {
    pub fn label(&self) -> &'static str {
        match self {
            AlertType::CertificateExpired { .. } => "certificate_expired",
            AlertType::CertificateExpiring { .. } => "certificate_expiring",
            AlertType::Test => "test",
        }
    }
}

/// Alert message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub site_name: String,
    pub address: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub certificate_subject: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Build the outbound alert for a finding
    pub fn from_finding(finding: &Finding) -> Self {
        let alert_type = match &finding.kind {
            FindingKind::Expired { not_after } => AlertType::CertificateExpired {
                not_after: *not_after,
            },
            FindingKind::ExpiringSoon {
                not_after,
                remaining_hours,
            } => AlertType::CertificateExpiring {
                not_after: *not_after,
                remaining_hours: *remaining_hours,
            },
        };

        Self {
            site_name: finding.site_name.clone(),
            address: finding.address.clone(),
            alert_type,
            severity: finding.severity,
            message: finding.message.clone(),
            certificate_subject: Some(finding.certificate_subject.clone()),
            timestamp: finding.detected_at,
        }
    }

    /// Synthetic alert used to verify channel connectivity
    pub fn test() -> Self {
        Self {
            site_name: "test".to_string(),
            address: "https://test.example.com".to_string(),
            alert_type: AlertType::Test,
            severity: Severity::Info,
            message: "Test alert from certmonitor".to_string(),
            certificate_subject: None,
            timestamp: Utc::now(),
        }
    }
}

/// Alert manager - fans each alert out to every configured channel
pub struct AlertManager {
    channels: Vec<Box<dyn AlertChannel>>,
}

impl AlertManager {
    /// Create new alert manager with no channels
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let mut manager = Self::new();

        if let Some(ref webhook_config) = config.monitor.alerts.webhook
            && webhook_config.enabled
        {
            let channel = webhook::WebhookChannel::new(webhook_config.clone())?;
            manager.add_channel(Box::new(channel));
        }

        if let Some(ref slack_config) = config.monitor.alerts.slack
            && slack_config.enabled
        {
            let channel = slack::SlackChannel::new(slack_config.clone())?;
            manager.add_channel(Box::new(channel));
        }

        Ok(manager)
    }

    /// Add an alert channel
    pub fn add_channel(&mut self, channel: Box<dyn AlertChannel>) {
        self.channels.push(channel);
    }

    /// Send alert through all channels concurrently
    ///
    /// Succeeds when at least one channel accepted the alert, or when no
    /// channels are configured.
    pub async fn send_alert(&self, alert: &Alert) -> Result<()> {
        let tasks = self.channels.iter().map(|channel| async move {
            let channel_name = channel.channel_name();
            match channel.send_alert(alert).await {
                Ok(()) => {
                    tracing::info!("Alert sent via {}: {}", channel_name, alert.message);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Failed to send alert via {}: {}", channel_name, e);
                    Err(e)
                }
            }
        });

        let results = futures::future::join_all(tasks).await;
        let success_count = results.iter().filter(|r| r.is_ok()).count();

        if success_count == 0 && !self.channels.is_empty() {
            return Err(MonitorError::Alert {
                channel: "all".to_string(),
                details: "All alert channels failed".to_string(),
            });
        }

        Ok(())
    }

    /// Get channel count
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Names of the configured channels
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel_name()).collect()
    }

    /// Test all channels
    pub async fn test_channels(&self) -> Vec<(String, Result<()>)> {
        let mut results = Vec::new();

        for channel in &self.channels {
            let result = match channel.test_connection().await {
                Ok(()) => channel.send_alert(&Alert::test()).await,
                Err(e) => Err(e),
            };
            results.push((channel.channel_name().to_string(), result));
        }

        results
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for AlertManager {
    async fn notify(&self, finding: &Finding) -> Result<()> {
        self.send_alert(&Alert::from_finding(finding)).await
    }
}

// Monitoring configuration

use crate::config_bail;
use crate::monitor::registry::{Site, SiteRegistry};
use crate::monitor::schedule::ScheduleExpr;
use crate::utils::duration::serde_duration;
use crate::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default lead time before expiry that triggers a warning (7 days)
pub const DEFAULT_LEAD_TIME: Duration = Duration::from_secs(7 * 24 * 3600);

/// Default bound on a single certificate fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of sites checked at once
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 10;

/// Main monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub monitor: MonitorSettings,
}

/// Monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// When passes fire: `@every <duration>`, a descriptor or a cron expression
    pub schedule: String,

    /// Warn once remaining validity drops below this
    #[serde(default = "default_lead_time", with = "serde_duration")]
    pub lead_time: Duration,

    /// Bound on each site's fetch
    #[serde(default = "default_timeout", with = "serde_duration")]
    pub timeout: Duration,

    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,

    /// Run one pass immediately instead of waiting for the first tick
    #[serde(default)]
    pub check_on_startup: bool,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default)]
    pub sites: Vec<Site>,
}

/// Alerts configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,
}

/// Slack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub enabled: bool,
    pub webhook_url: String,
}

/// Webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_lead_time() -> Duration {
    DEFAULT_LEAD_TIME
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_max_concurrent_checks() -> usize {
    DEFAULT_MAX_CONCURRENT_CHECKS
}

impl MonitorConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| MonitorError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: MonitorConfig = toml::from_str(contents).map_err(|e| MonitorError::Config {
            message: format!("Failed to parse TOML config: {}", e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Configuration written by `--example-config`
    pub fn example() -> Self {
        Self {
            monitor: MonitorSettings {
                schedule: "@every 1h".to_string(),
                lead_time: DEFAULT_LEAD_TIME,
                timeout: DEFAULT_TIMEOUT,
                max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
                check_on_startup: false,
                alerts: AlertsConfig {
                    webhook: Some(WebhookConfig {
                        enabled: false,
                        url: "https://alerts.example.com/hooks/certmonitor".to_string(),
                        headers: HashMap::new(),
                    }),
                    slack: None,
                },
                sites: vec![
                    Site::new("bleem", "bleem blog", "https://mritd.com"),
                    Site::new("baidu", "baidu search", "https://baidu.com"),
                ],
            },
        }
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;

        fs::write(path.as_ref(), toml_str).map_err(|e| MonitorError::Config {
            message: format!("Failed to write config file {:?}: {}", path.as_ref(), e),
        })?;

        Ok(())
    }

    /// Check everything that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<()> {
        let settings = &self.monitor;

        self.schedule_expr()?;

        if settings.timeout.is_zero() {
            config_bail!("timeout must be greater than zero");
        }

        if settings.max_concurrent_checks == 0 {
            config_bail!("max_concurrent_checks must be at least 1");
        }

        if settings.sites.is_empty() {
            config_bail!("no sites configured; add at least one [[monitor.sites]] entry");
        }

        SiteRegistry::new(settings.sites.clone())?;

        if let Some(ref webhook) = settings.alerts.webhook
            && webhook.enabled
            && webhook.url.trim().is_empty()
        {
            config_bail!("webhook alerts are enabled but no url is set");
        }

        if let Some(ref slack) = settings.alerts.slack
            && slack.enabled
            && slack.webhook_url.trim().is_empty()
        {
            config_bail!("slack alerts are enabled but no webhook_url is set");
        }

        Ok(())
    }

    /// Parsed schedule expression
    pub fn schedule_expr(&self) -> Result<ScheduleExpr> {
        ScheduleExpr::parse(&self.monitor.schedule)
    }

    /// Site registry built from the configured sites
    pub fn site_registry(&self) -> Result<SiteRegistry> {
        SiteRegistry::new(self.monitor.sites.clone())
    }

    /// Get list of enabled alert channels
    pub fn enabled_channels(&self) -> Vec<String> {
        let mut channels = Vec::new();

        if let Some(ref webhook) = self.monitor.alerts.webhook
            && webhook.enabled
        {
            channels.push("webhook".to_string());
        }

        if let Some(ref slack) = self.monitor.alerts.slack
            && slack.enabled
        {
            channels.push("slack".to_string());
        }

        channels
    }
}

// Alert Channel Trait

use crate::Result;
use crate::monitor::alerts::Alert;
use async_trait::async_trait;
use std::time::Duration;

/// Upper bound on a single delivery attempt
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination for alerts. Implement this to add a delivery mechanism.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Deliver one alert
    async fn send_alert(&self, alert: &Alert) -> Result<()>;

    /// Channel name used in logs and test reports
    fn channel_name(&self) -> &str;

    /// Check the destination is reachable before a test alert is sent
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}

/// HTTP client shared by the webhook-style channels
pub(crate) fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(DELIVERY_TIMEOUT)
        .user_agent(concat!("certmonitor/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Reject endpoint URLs that could never receive a POST
pub(crate) fn validate_endpoint(channel: &str, raw: &str) -> Result<url::Url> {
    let url = url::Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(crate::MonitorError::Config {
            message: format!("{} endpoint must use http or https, got {}", channel, other),
        }),
    }
}

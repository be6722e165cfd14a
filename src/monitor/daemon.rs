// Monitoring Daemon - Main orchestration

use crate::certificates::fetcher::{CertificateFetcher, TlsCertificateFetcher};
use crate::monitor::alerts::{AlertManager, Notifier};
use crate::monitor::config::MonitorConfig;
use crate::monitor::evaluator::ExpiryEvaluator;
use crate::monitor::scheduler::{PassSummary, Scheduler};
use crate::utils::duration::format_duration;
use crate::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Main monitoring daemon
pub struct MonitorDaemon {
    config: MonitorConfig,
    scheduler: Arc<Scheduler>,
    alert_manager: Arc<AlertManager>,
    running: Arc<AtomicBool>,
}

impl MonitorDaemon {
    /// Create the daemon with the TLS fetcher that skips trust validation
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let fetcher = TlsCertificateFetcher::skip_trust_validation()?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create the daemon around a caller-supplied fetcher
    pub fn with_fetcher(
        config: MonitorConfig,
        fetcher: Arc<dyn CertificateFetcher>,
    ) -> Result<Self> {
        config.validate()?;

        let settings = &config.monitor;
        let alert_manager = Arc::new(AlertManager::from_config(&config)?);
        let notifier: Arc<dyn Notifier> = alert_manager.clone();

        let scheduler = Scheduler::new(
            config.schedule_expr()?,
            Arc::new(config.site_registry()?),
            fetcher,
            notifier,
            ExpiryEvaluator::new(settings.lead_time),
            settings.timeout,
            settings.max_concurrent_checks,
        )
        .with_check_on_startup(settings.check_on_startup);

        Ok(Self {
            config,
            scheduler: Arc::new(scheduler),
            alert_manager,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Run until the schedule ends or a shutdown signal arrives
    pub async fn start(&self) -> Result<()> {
        tracing::info!("Starting certificate monitor");
        tracing::info!(
            "Monitoring {} sites on schedule {}",
            self.scheduler.registry().len(),
            self.scheduler.schedule()
        );
        tracing::info!(
            "Lead time {}, fetch timeout {}, max concurrent checks {}",
            format_duration(self.config.monitor.lead_time),
            format_duration(self.config.monitor.timeout),
            self.config.monitor.max_concurrent_checks
        );

        let channels = self.config.enabled_channels();
        if channels.is_empty() {
            tracing::warn!("No alert channels enabled; findings will only be logged");
        } else {
            tracing::info!("Alert channels: {}", channels.join(", "));
        }

        self.running.store(true, Ordering::SeqCst);

        let result = tokio::select! {
            result = self.scheduler.start() => result,
            result = shutdown_signal() => result,
        };

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Certificate monitor stopped");
        result
    }

    /// Run a single pass immediately
    pub async fn run_once(&self) -> PassSummary {
        self.scheduler.run_pass().await
    }

    /// Test all alert channels
    pub async fn test_alerts(&self) -> Vec<(String, Result<()>)> {
        self.alert_manager.test_channels().await
    }

    /// Get daemon statistics
    pub fn stats(&self) -> DaemonStats {
        DaemonStats {
            sites: self.scheduler.registry().len(),
            schedule: self.scheduler.schedule().to_string(),
            alert_channels: self.alert_manager.channel_count(),
            passes_completed: self.scheduler.passes_completed(),
            running: self.running.load(Ordering::SeqCst),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

/// Daemon statistics
#[derive(Debug, Clone)]
pub struct DaemonStats {
    pub sites: usize,
    pub schedule: String,
    pub alert_channels: usize,
    pub passes_completed: u64,
    pub running: bool,
}

/// Resolves once SIGINT or SIGTERM (Ctrl+C elsewhere) is received
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::parser::{CertificateChain, CertificateInfo};
    use crate::{MonitorError, config_bail};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    struct ExpiredFetcher;

    #[async_trait]
    impl CertificateFetcher for ExpiredFetcher {
        async fn fetch(&self, address: &str, _timeout: Duration) -> Result<CertificateChain> {
            if address.contains("unreachable") {
                config_bail!("unreachable in test");
            }
            let not_after = Utc::now() - chrono::Duration::days(1);
            Ok(CertificateChain::new(vec![CertificateInfo {
                subject: "CN=expired.test".to_string(),
                common_name: Some("expired.test".to_string()),
                issuer: "CN=Test CA".to_string(),
                serial_number: "02".to_string(),
                not_before: not_after - chrono::Duration::days(90),
                not_after,
                san: vec!["expired.test".to_string()],
                is_ca: false,
            }]))
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig::from_toml_str(
            r#"
[monitor]
schedule = "@every 1h"
timeout = "2s"

[[monitor.sites]]
name = "expired"
address = "https://expired.test"

[[monitor.sites]]
name = "gone"
address = "https://unreachable.test"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_daemon_creation() {
        let daemon = MonitorDaemon::new(config()).unwrap();
        let stats = daemon.stats();

        assert_eq!(stats.sites, 2);
        assert_eq!(stats.schedule, "@every 1h");
        assert_eq!(stats.alert_channels, 0);
        assert_eq!(stats.passes_completed, 0);
        assert!(!stats.running);
    }

    #[test]
    fn test_daemon_rejects_invalid_config() {
        let mut config = config();
        config.monitor.schedule = "not a schedule".to_string();

        let err = MonitorDaemon::with_fetcher(config, Arc::new(ExpiredFetcher)).err().unwrap();
        assert!(matches!(err, MonitorError::Schedule { .. }));
    }

    #[tokio::test]
    async fn test_run_once() {
        let daemon = MonitorDaemon::with_fetcher(config(), Arc::new(ExpiredFetcher)).unwrap();

        let summary = daemon.run_once().await;
        assert_eq!(summary.sites_checked, 2);
        assert_eq!(summary.findings.len(), 1);
        assert_eq!(summary.findings[0].site_name, "expired");
        assert_eq!(summary.fetch_failures.len(), 1);
        assert_eq!(daemon.stats().passes_completed, 1);
    }

    #[tokio::test]
    async fn test_alerts_without_channels() {
        let daemon = MonitorDaemon::with_fetcher(config(), Arc::new(ExpiredFetcher)).unwrap();
        assert!(daemon.test_alerts().await.is_empty());
    }
}

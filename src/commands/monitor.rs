// MonitorCommand - Certificate monitoring daemon
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::Command;
use crate::monitor::{MonitorConfig, MonitorDaemon, PassSummary};
use crate::{Args, MonitorError, Result};
use async_trait::async_trait;
use colored::Colorize;
use tracing::info;

/// MonitorCommand handles certificate monitoring operations
///
/// This command is responsible for:
/// - Loading and validating the monitoring configuration
/// - Testing alert channels (--test-alert)
/// - Running a single pass (--once)
/// - Starting the monitoring daemon (default)
pub struct MonitorCommand {
    args: Args,
}

impl MonitorCommand {
    /// Create a new MonitorCommand with the given arguments
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    fn load_config(&self) -> Result<MonitorConfig> {
        let path = self.args.monitoring.config_path();
        info!("Loading configuration from {}", path.display());
        MonitorConfig::from_file(&path)
    }

    async fn test_alerts(daemon: &MonitorDaemon) -> Result<()> {
        info!("Testing alert channels...");
        let results = daemon.test_alerts().await;

        println!("\nAlert Channel Tests:");
        println!("{}", "=".repeat(80));

        if results.is_empty() {
            println!("No alert channels configured");
            println!();
            return Ok(());
        }

        let mut failures = 0;
        for (channel_name, result) in &results {
            match result {
                Ok(()) => println!("  {} {} - Success", "✓".green(), channel_name),
                Err(e) => {
                    failures += 1;
                    println!("  {} {} - Failed: {}", "✗".red(), channel_name, e);
                }
            }
        }
        println!();

        if failures == results.len() {
            return Err(MonitorError::Alert {
                channel: "all".to_string(),
                details: "every alert channel test failed".to_string(),
            });
        }

        Ok(())
    }

    fn print_summary(summary: &PassSummary) {
        println!("\nCertificate Check Summary:");
        println!("{}", "=".repeat(80));
        println!(
            "  Sites checked: {}   Healthy: {}   Findings: {}   Fetch failures: {}",
            summary.sites_checked,
            summary.healthy.to_string().green(),
            summary.findings.len().to_string().yellow(),
            summary.fetch_failures.len().to_string().red()
        );

        for finding in &summary.findings {
            let marker = match finding.kind {
                crate::monitor::FindingKind::Expired { .. } => "✗".red(),
                crate::monitor::FindingKind::ExpiringSoon { .. } => "!".yellow(),
            };
            println!("  {} {}", marker, finding.message);
        }

        for (site, error) in &summary.fetch_failures {
            println!("  {} {} - {}", "?".dimmed(), site, error);
        }

        if summary.undelivered > 0 {
            println!("  {} finding(s) could not be delivered", summary.undelivered);
        }
        println!();
    }
}

#[async_trait]
impl Command for MonitorCommand {
    async fn execute(&self) -> Result<()> {
        let daemon = MonitorDaemon::new(self.load_config()?)?;

        if self.args.monitoring.test_alert {
            return Self::test_alerts(&daemon).await;
        }

        if self.args.monitoring.once {
            let summary = daemon.run_once().await;
            Self::print_summary(&summary);
            return Ok(());
        }

        info!("Starting certificate monitoring daemon");
        daemon.start().await
    }

    fn name(&self) -> &'static str {
        "MonitorCommand"
    }
}

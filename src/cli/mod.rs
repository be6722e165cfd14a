// CLI module - Command line interface and argument parsing
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use clap::Parser;
use std::path::PathBuf;

mod monitoring_args;

pub use monitoring_args::{DEFAULT_CONFIG_FILE, MonitoringArgs};

/// certmonitor - Scheduled TLS certificate expiry monitor
///
/// Loads a TOML configuration describing the sites to watch, the schedule
/// and the alert channels, then checks every site on each tick.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, long_about = None)]
#[command(name = "certmonitor")]
#[command(about = "Scheduled TLS certificate expiry monitor", long_about = None)]
pub struct Args {
    // ============ Certificate Monitoring ============
    #[command(flatten)]
    pub monitoring: MonitoringArgs,

    // ============ Configuration Helpers ============
    /// Write an example configuration to FILE and exit
    #[arg(long = "example-config", value_name = "FILE")]
    pub example_config: Option<PathBuf>,
}

impl Args {
    /// Reject flag combinations that select more than one mode
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.monitoring.once && self.monitoring.test_alert {
            anyhow::bail!("--once and --test-alert cannot be combined");
        }

        if self.example_config.is_some() && (self.monitoring.once || self.monitoring.test_alert) {
            anyhow::bail!("--example-config cannot be combined with --once or --test-alert");
        }

        Ok(())
    }
}

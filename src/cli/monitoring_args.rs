// Certificate monitoring configuration arguments
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use clap::Args;
use std::path::PathBuf;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "certmonitor.toml";

/// Certificate monitoring options
///
/// Selects the configuration file and whether to run the daemon, a single
/// pass, or an alert channel test.
#[derive(Args, Debug, Clone, Default)]
pub struct MonitoringArgs {
    /// Monitoring configuration file (TOML format) [default: certmonitor.toml]
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run a single pass over all sites, print a summary and exit
    #[arg(long = "once")]
    pub once: bool,

    /// Test alert channels (send test alert to all configured channels)
    #[arg(long = "test-alert")]
    pub test_alert: bool,
}

impl MonitoringArgs {
    /// Configuration path, falling back to the default file name
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

// certmonitor - Scheduled TLS certificate expiry monitor
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

//! certmonitor periodically connects to a fixed list of HTTPS sites, reads the
//! certificate chain each one presents and raises an alert when a certificate
//! has expired or will expire within a configured lead time.

pub mod certificates;
pub mod cli;
pub mod commands;
pub mod error;
pub mod monitor;
pub mod utils;

// Re-export commonly used types
pub use crate::cli::Args;
pub use crate::error::MonitorError;
pub use crate::monitor::{MonitorConfig, MonitorDaemon};

/// Result type for certmonitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

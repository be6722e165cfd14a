// CommandRouter - Routes CLI arguments to appropriate Command
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::{Command, ExampleConfigCommand, MonitorCommand};
use crate::{Args, MonitorError, Result};

/// CommandRouter determines which Command to execute based on CLI arguments
///
/// Routing priority:
/// 1. Example configuration (--example-config)
/// 2. Monitoring: daemon, single pass (--once) or alert test (--test-alert)
pub struct CommandRouter;

impl CommandRouter {
    /// Route CLI arguments to the appropriate Command
    ///
    /// # Errors
    /// Returns `MonitorError::Config` for conflicting flags
    pub fn route(args: Args) -> Result<Box<dyn Command>> {
        Self::validate_routing(&args)?;

        if let Some(path) = args.example_config.clone() {
            return Ok(Box::new(ExampleConfigCommand::new(path)));
        }

        Ok(Box::new(MonitorCommand::new(args)))
    }

    /// Check if the given arguments represent a valid command configuration
    pub fn validate_routing(args: &Args) -> Result<()> {
        args.validate().map_err(|e| MonitorError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_route_example_config() {
        let args = Args {
            example_config: Some(PathBuf::from("example.toml")),
            ..Args::default()
        };
        let cmd = CommandRouter::route(args).expect("test assertion should succeed");
        assert_eq!(cmd.name(), "ExampleConfigCommand");
    }

    #[test]
    fn test_route_monitor_default() {
        let cmd = CommandRouter::route(Args::default()).expect("test assertion should succeed");
        assert_eq!(cmd.name(), "MonitorCommand");
    }

    #[test]
    fn test_route_once_and_test_alert() {
        let mut args = Args::default();
        args.monitoring.once = true;
        assert_eq!(CommandRouter::route(args).unwrap().name(), "MonitorCommand");

        let mut args = Args::default();
        args.monitoring.test_alert = true;
        assert_eq!(CommandRouter::route(args).unwrap().name(), "MonitorCommand");
    }

    #[test]
    fn test_validate_routing_conflict() {
        let mut args = Args::default();
        args.monitoring.once = true;
        args.monitoring.test_alert = true;

        let err = CommandRouter::validate_routing(&args).unwrap_err();
        assert!(matches!(err, MonitorError::Config { .. }));
        assert!(CommandRouter::route(args).is_err());
    }
}

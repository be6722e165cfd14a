// Commands module - Command Pattern implementation
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

mod command;
mod router;

// Individual command implementations
mod example_config;
mod monitor;

pub use command::Command;
pub use router::CommandRouter;

// Re-export individual commands for testing purposes
pub use example_config::ExampleConfigCommand;
pub use monitor::MonitorCommand;

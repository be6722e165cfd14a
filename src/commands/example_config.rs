// ExampleConfigCommand - Write an example monitoring configuration
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::Command;
use crate::monitor::MonitorConfig;
use crate::{MonitorError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Writes `MonitorConfig::example()` to a file, refusing to overwrite
pub struct ExampleConfigCommand {
    path: PathBuf,
}

impl ExampleConfigCommand {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Command for ExampleConfigCommand {
    async fn execute(&self) -> Result<()> {
        if self.path.exists() {
            return Err(MonitorError::Config {
                message: format!("{} already exists; not overwriting", self.path.display()),
            });
        }

        MonitorConfig::example().save_to_file(&self.path)?;
        println!("✓ Example monitoring configuration saved to: {}", self.path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ExampleConfigCommand"
    }
}

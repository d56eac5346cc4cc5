//! CLI command implementations.

pub mod radar;
pub mod scan;

use std::path::PathBuf;

use anyhow::{Context, Result};
use sonar_core::{Config, ProcessHandle};
use tracing::info;

/// How to find the target process and its signatures.
pub struct Target {
    pub pid: Option<u32>,
    pub signatures: Option<PathBuf>,
}

impl Target {
    pub fn open(&self, config: &Config) -> Result<ProcessHandle> {
        let process = match self.pid {
            Some(pid) => ProcessHandle::open(pid)
                .with_context(|| format!("Failed to open process {}", pid))?,
            None => ProcessHandle::find_and_open(&config.process.name)
                .with_context(|| format!("Target process {:?} not found", config.process.name))?,
        };
        info!("Attached to process {}", process.pid);
        Ok(process)
    }
}

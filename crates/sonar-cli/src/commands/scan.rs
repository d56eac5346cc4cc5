//! Offset scan command.

use std::path::Path;

use anyhow::Result;
use sonar_core::{Config, MemoryReader, save_offsets};
use tracing::info;

use super::Target;
use crate::offsets;

/// Scan the target module and print the offsets found.
pub fn run(config: &Config, target: &Target, output: Option<&Path>) -> Result<()> {
    let process = target.open(config)?;
    let reader = MemoryReader::new(&process);

    let found = offsets::scan(&reader, config, target.signatures.as_deref())?;

    println!("World: 0x{:X}", found.world);
    println!("Names: 0x{:X}", found.names);

    if let Some(path) = output {
        save_offsets(path, &found)?;
        info!("Saved offsets to {}", path.display());
    }

    Ok(())
}

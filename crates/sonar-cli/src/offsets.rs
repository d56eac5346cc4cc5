//! Offset resolution: load from file when possible, scan otherwise.

use std::path::Path;

use anyhow::{Context, Result};
use sonar_core::{
    Config, MemoryReader, OffsetSearcher, OffsetSignatureSet, OffsetsCollection, ReadMemory,
    builtin_signatures, load_offsets, load_signatures,
};
use tracing::{debug, info, warn};

/// Resolved offsets and whether they came from a scan.
pub struct Resolved {
    pub offsets: OffsetsCollection,
    pub scanned: bool,
}

/// Use the offsets file if it loads and both globals are readable,
/// otherwise scan the target module.
pub fn resolve(
    reader: &MemoryReader,
    config: &Config,
    offsets_file: Option<&Path>,
    signatures_file: Option<&Path>,
) -> Result<Resolved> {
    if let Some(path) = offsets_file {
        match load_offsets(path) {
            Ok(offsets) if readable(reader, &offsets) => {
                info!("Loaded offsets from {}", path.display());
                debug!("  World: {:#x}, Names: {:#x}", offsets.world, offsets.names);
                return Ok(Resolved {
                    offsets,
                    scanned: false,
                });
            }
            Ok(_) => info!("Offsets in {} are stale, scanning instead", path.display()),
            Err(e) if e.is_not_found() => {
                info!("Offsets file {} not found, scanning", path.display())
            }
            Err(e) => warn!("Failed to load offsets from {}: {}", path.display(), e),
        }
    }

    let offsets = scan(reader, config, signatures_file)?;
    Ok(Resolved {
        offsets,
        scanned: true,
    })
}

/// Run every signature over the target module.
pub fn scan(
    reader: &MemoryReader,
    config: &Config,
    signatures_file: Option<&Path>,
) -> Result<OffsetsCollection> {
    let signatures = signature_set(signatures_file)?;
    let region = reader
        .process()
        .executable_region(&config.process.module)
        .with_context(|| format!("Module {:?} not mapped", config.process.module))?;
    debug!(
        "Scanning {:#x}..{:#x} ({} bytes)",
        region.start,
        region.end,
        region.len()
    );

    let searcher = OffsetSearcher::new(reader, region);
    let offsets = searcher
        .search_all(&signatures)
        .context("Signature scan failed")?;
    Ok(offsets)
}

fn signature_set(path: Option<&Path>) -> Result<OffsetSignatureSet> {
    match path {
        Some(path) => {
            let set = load_signatures(path)
                .with_context(|| format!("Failed to load signatures from {}", path.display()))?;
            info!("Loaded signatures {} from {}", set.version, path.display());
            Ok(set)
        }
        None => Ok(builtin_signatures()),
    }
}

fn readable(reader: &impl ReadMemory, offsets: &OffsetsCollection) -> bool {
    offsets.is_valid()
        && reader.read_u64(offsets.world).is_ok()
        && reader.read_u64(offsets.names).is_ok()
}

//! Signature scan over the target's executable section

use memchr::memchr_iter;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::memory::{ModuleRegion, ReadMemory, checked_offset};
use crate::offset::{CodeSignature, OffsetSignatureSet, OffsetsCollection};

const CODE_SCAN_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// First offset in `haystack` where `pattern` matches.
///
/// Scanning is anchored on the first fixed byte so memchr does the heavy
/// lifting; the remaining bytes are compared only at candidate positions.
pub fn find_pattern(haystack: &[u8], pattern: &[Option<u8>]) -> Option<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return None;
    }

    let (anchor_index, anchor) = pattern
        .iter()
        .enumerate()
        .find_map(|(i, b)| b.map(|value| (i, value)))?;
    let last = haystack.len() - pattern.len();

    for hit in memchr_iter(anchor, &haystack[anchor_index..]) {
        let start = hit;
        if start > last {
            break;
        }
        let window = &haystack[start..start + pattern.len()];
        let matched = pattern
            .iter()
            .zip(window)
            .all(|(expected, actual)| expected.is_none_or(|value| value == *actual));
        if matched {
            return Some(start);
        }
    }

    None
}

pub struct OffsetSearcher<'a, R: ReadMemory> {
    reader: &'a R,
    region: ModuleRegion,
}

impl<'a, R: ReadMemory> OffsetSearcher<'a, R> {
    pub fn new(reader: &'a R, region: ModuleRegion) -> Self {
        Self { reader, region }
    }

    /// Resolve the world and name pool globals.
    pub fn search_all(&self, signatures: &OffsetSignatureSet) -> Result<OffsetsCollection> {
        debug!(
            "Scanning {:#x}..{:#x} ({} bytes)",
            self.region.start,
            self.region.end,
            self.region.len()
        );

        let world = self.search_entry(signatures, "world")?;
        let names = self.search_entry(signatures, "names")?;

        let offsets = OffsetsCollection {
            version: signatures.version.clone(),
            world,
            names,
        };
        if !offsets.is_valid() {
            return Err(Error::InvalidOffset(
                "Signature scan produced a zero address".to_string(),
            ));
        }

        info!(
            "Offsets resolved: world={:#x} names={:#x}",
            offsets.world, offsets.names
        );
        Ok(offsets)
    }

    fn search_entry(&self, signatures: &OffsetSignatureSet, name: &str) -> Result<u64> {
        let entry = signatures.entry(name).ok_or_else(|| {
            Error::SignatureNotFound(format!("No signature entry named '{}'", name))
        })?;

        for signature in &entry.signatures {
            if let Some(target) = self.resolve(signature)? {
                debug!("  {}: {:#x} (signature: {})", name, target, signature.pattern);
                return Ok(target);
            }
            debug!("  {}: no match for {}", name, signature.pattern);
        }

        Err(Error::SignatureNotFound(format!(
            "{} not found in executable section",
            name
        )))
    }

    /// Scan for `signature` and follow its displacement.
    pub fn resolve(&self, signature: &CodeSignature) -> Result<Option<u64>> {
        let pattern = signature.pattern_bytes()?;
        let Some(match_addr) = self.scan_code_for_pattern(&pattern)? else {
            return Ok(None);
        };

        let disp = self
            .reader
            .read_i32(checked_offset(match_addr, signature.disp_offset as u64)?)?;
        Ok(Some(signature.target(match_addr, disp)))
    }

    /// First match address in the region. Chunks overlap by the pattern
    /// length so a match straddling two reads is still found.
    fn scan_code_for_pattern(&self, pattern: &[Option<u8>]) -> Result<Option<u64>> {
        let mut addr = self.region.start;
        let mut tail: Vec<u8> = Vec::new();

        while addr < self.region.end {
            let read_size = ((self.region.end - addr) as usize).min(CODE_SCAN_CHUNK_SIZE);
            let chunk = match self.reader.read_bytes(addr, read_size) {
                Ok(bytes) if !bytes.is_empty() => bytes,
                Ok(_) | Err(_) if addr == self.region.start => {
                    return Err(Error::ModuleNotFound(format!(
                        "Executable section at {:#x} is unreadable",
                        addr
                    )));
                }
                Ok(_) => break,
                Err(e) => {
                    debug!("Code scan stopped at {:#x}: {}", addr, e);
                    break;
                }
            };
            let chunk_len = chunk.len();

            let mut data = Vec::with_capacity(tail.len() + chunk_len);
            data.extend_from_slice(&tail);
            data.extend_from_slice(&chunk);
            let data_base = addr - tail.len() as u64;

            if let Some(pos) = find_pattern(&data, pattern) {
                return Ok(Some(data_base + pos as u64));
            }

            let keep = pattern.len().saturating_sub(1).min(data.len());
            tail = data[data.len() - keep..].to_vec();

            if chunk_len < read_size {
                break;
            }
            addr += chunk_len as u64;
        }

        Ok(None)
    }
}

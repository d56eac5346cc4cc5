use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// An instruction pattern whose RIP-relative operand points at a global.
///
/// The 4-byte displacement sits `disp_offset` bytes into the match and is
/// relative to the end of itself, so the target is
/// `match + disp_offset + 4 + disp + addend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSignature {
    pub pattern: String,
    pub disp_offset: usize,
    #[serde(default)]
    pub addend: i64,
}

impl CodeSignature {
    pub fn new(pattern: &str, disp_offset: usize) -> Self {
        Self {
            pattern: pattern.to_string(),
            disp_offset,
            addend: 0,
        }
    }

    pub fn with_addend(mut self, addend: i64) -> Self {
        self.addend = addend;
        self
    }

    pub fn pattern_bytes(&self) -> Result<Vec<Option<u8>>> {
        parse_pattern(&self.pattern)
    }

    /// Absolute target for a match at `match_addr` with displacement `disp`.
    pub fn target(&self, match_addr: u64, disp: i32) -> u64 {
        let next_ip = match_addr + self.disp_offset as u64 + 4;
        next_ip
            .wrapping_add_signed(disp as i64)
            .wrapping_add_signed(self.addend)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetSignatureEntry {
    pub name: String,
    pub signatures: Vec<CodeSignature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetSignatureSet {
    pub version: String,
    pub entries: Vec<OffsetSignatureEntry>,
}

impl OffsetSignatureSet {
    pub fn entry(&self, name: &str) -> Option<&OffsetSignatureEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}

/// Signatures for the supported build.
pub fn builtin_signatures() -> OffsetSignatureSet {
    OffsetSignatureSet {
        version: "builtin".to_string(),
        entries: vec![
            OffsetSignatureEntry {
                name: "world".to_string(),
                signatures: vec![CodeSignature::new("85 C0 75 ?? ?? 8B 05 ?? ?? ?? ?? C3", 7)],
            },
            OffsetSignatureEntry {
                name: "names".to_string(),
                signatures: vec![
                    CodeSignature::new("8B 05 ?? ?? ?? ?? FF C0 C1 E9", 2).with_addend(8),
                ],
            },
        ],
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<OffsetSignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

/// Parse space-separated hex tokens; `?` and `??` are wildcards.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidSignature(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidSignature(
            "Signature pattern is empty".to_string(),
        ));
    }
    if bytes.iter().all(Option::is_none) {
        return Err(Error::InvalidSignature(
            "Signature pattern has no fixed bytes".to_string(),
        ));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[Option<u8>]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            Some(value) => format!("{:02X}", value),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

//! Interned name pool reader.
//!
//! Actors carry a two-part handle into the target's global name pool instead
//! of an inline string. Entries in that pool are written once and never
//! change, so every resolved handle is cached for the life of the process.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::memory::layout::names::{
    BLOCK_POINTER_SIZE, HEADER_LEN_SHIFT, HEADER_SIZE, HEADER_WIDE_BIT, SLOT_STRIDE,
};
use crate::memory::{ReadMemory, TextEncoding, checked_offset};

/// Handle into the name pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameHandle {
    pub block: u16,
    pub slot: u16,
}

impl NameHandle {
    pub const fn new(block: u16, slot: u16) -> Self {
        Self { block, slot }
    }

    /// Build from the two little-endian u16s stored on an actor: slot first,
    /// then block.
    pub const fn from_raw_pair(first: u16, second: u16) -> Self {
        Self {
            block: second,
            slot: first,
        }
    }
}

pub struct NamePool {
    /// Address of the block pointer table
    table: u64,
    cache: HashMap<NameHandle, Arc<str>>,
    log_new_names: bool,
}

impl NamePool {
    pub fn new(table: u64) -> Self {
        Self {
            table,
            cache: HashMap::new(),
            log_new_names: false,
        }
    }

    /// Log every name the first time it is resolved.
    pub fn with_name_logging(mut self, enabled: bool) -> Self {
        self.log_new_names = enabled;
        self
    }

    pub fn table(&self) -> u64 {
        self.table
    }

    pub fn cached(&self, handle: NameHandle) -> Option<Arc<str>> {
        self.cache.get(&handle).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Resolve `handle`, reading the pool only on a cache miss.
    pub fn resolve<R: ReadMemory>(&mut self, reader: &R, handle: NameHandle) -> Result<Arc<str>> {
        if let Some(name) = self.cache.get(&handle) {
            return Ok(Arc::clone(name));
        }

        let name: Arc<str> = Arc::from(self.read_entry(reader, handle)?);
        if self.log_new_names {
            info!("{}", name);
        } else {
            debug!(
                "Resolved name [{}:{}] -> {}",
                handle.block, handle.slot, name
            );
        }
        self.cache.insert(handle, Arc::clone(&name));
        Ok(name)
    }

    fn read_entry<R: ReadMemory>(&self, reader: &R, handle: NameHandle) -> Result<String> {
        let block_offset = handle.block as u64 * BLOCK_POINTER_SIZE;
        let block_base = reader.read_ptr(checked_offset(self.table, block_offset)?)?;

        let entry = checked_offset(block_base, handle.slot as u64 * SLOT_STRIDE)?;
        let header = reader.read_u16(entry)?;
        let len = (header >> HEADER_LEN_SHIFT) as usize;
        let text = checked_offset(entry, HEADER_SIZE)?;

        if header & HEADER_WIDE_BIT != 0 {
            reader.read_fixed_string(text, len * 2, TextEncoding::Utf16Le)
        } else {
            reader.read_fixed_string(text, len, TextEncoding::Narrow)
        }
    }
}

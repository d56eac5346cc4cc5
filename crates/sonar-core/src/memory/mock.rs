//! In-memory fake address space for tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::Result;
use crate::memory::ReadMemory;

/// Sparse byte-addressed memory. Reads stop at the first unmapped byte,
/// which yields a short read just like a real target.
#[derive(Default)]
pub struct MockMemoryReader {
    bytes: RefCell<HashMap<u64, u8>>,
    reads: RefCell<Vec<(u64, usize)>>,
    alive: Cell<bool>,
}

impl MockMemoryReader {
    pub fn new() -> Self {
        Self {
            alive: Cell::new(true),
            ..Default::default()
        }
    }

    pub fn write_bytes(&self, address: u64, data: &[u8]) {
        let mut bytes = self.bytes.borrow_mut();
        for (i, b) in data.iter().enumerate() {
            bytes.insert(address + i as u64, *b);
        }
    }

    pub fn write_u64(&self, address: u64, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_f64(&self, address: u64, value: f64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_f32(&self, address: u64, value: f32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Remove `len` bytes starting at `address`.
    pub fn unmap(&self, address: u64, len: usize) {
        let mut bytes = self.bytes.borrow_mut();
        for i in 0..len as u64 {
            bytes.remove(&(address + i));
        }
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.set(alive);
    }

    /// Number of `read_bytes` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.borrow().len()
    }

    /// Number of reads that started at `address`.
    pub fn reads_at(&self, address: u64) -> usize {
        self.reads
            .borrow()
            .iter()
            .filter(|(addr, _)| *addr == address)
            .count()
    }

    /// Largest read size requested at `address`.
    pub fn bytes_read_at(&self, address: u64) -> Option<usize> {
        self.reads
            .borrow()
            .iter()
            .filter(|(addr, _)| *addr == address)
            .map(|(_, size)| *size)
            .max()
    }

    pub fn clear_reads(&self) {
        self.reads.borrow_mut().clear();
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.borrow_mut().push((address, size));

        let bytes = self.bytes.borrow();
        let mut out = Vec::with_capacity(size);
        for i in 0..size as u64 {
            let Some(b) = address.checked_add(i).and_then(|addr| bytes.get(&addr)) else {
                break;
            };
            out.push(*b);
        }
        Ok(out)
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn pid(&self) -> Option<u32> {
        Some(4242)
    }
}

/// Builder for [`MockMemoryReader`].
#[derive(Default)]
pub struct MockMemoryBuilder {
    writes: Vec<(u64, Vec<u8>)>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(mut self, address: u64, data: &[u8]) -> Self {
        self.writes.push((address, data.to_vec()));
        self
    }

    pub fn u8(self, address: u64, value: u8) -> Self {
        self.bytes(address, &[value])
    }

    pub fn u16(self, address: u64, value: u16) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn i32(self, address: u64, value: i32) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn u64(self, address: u64, value: u64) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn f32(self, address: u64, value: f32) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn f64(self, address: u64, value: f64) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn u64_array(self, address: u64, values: &[u64]) -> Self {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.bytes(address, &data)
    }

    /// UTF-16LE text; include `\0` in `text` to store the terminator.
    pub fn utf16(self, address: u64, text: &str) -> Self {
        let data: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        self.bytes(address, &data)
    }

    pub fn build(self) -> MockMemoryReader {
        let reader = MockMemoryReader::new();
        for (address, data) in &self.writes {
            reader.write_bytes(*address, data);
        }
        reader
    }
}

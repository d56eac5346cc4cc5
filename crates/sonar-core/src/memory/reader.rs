use encoding_rs::{UTF_16LE, WINDOWS_1252};

use crate::error::{Error, FaultReason, Result};
use crate::memory::ProcessHandle;
use crate::memory::shape::{Field, Record, Shape, Value};

/// Upper bound for a single string read; longer lengths are clamped.
pub const MAX_STRING_BYTES: usize = 512;

/// Text encodings used by the target for stored strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Single-byte pool strings.
    Narrow,
    /// UTF-16LE actor strings.
    Utf16Le,
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (decoded, _, _) = match self {
            TextEncoding::Narrow => WINDOWS_1252.decode(bytes),
            TextEncoding::Utf16Le => UTF_16LE.decode(bytes),
        };
        decoded.into_owned()
    }
}

/// Byte count for a stored UTF-16 string of `char_count` characters,
/// excluding the trailing null.
pub fn utf16_byte_len(char_count: u32) -> usize {
    (char_count as usize * 2).saturating_sub(2)
}

/// `base + offset`, or a [`Error::ReadFault`] when a garbage pointer would
/// wrap past the end of the address space.
pub fn checked_offset(base: u64, offset: u64) -> Result<u64> {
    base.checked_add(offset).ok_or_else(|| {
        Error::decode(base, format!("offset {:#x} overflows the address space", offset))
    })
}

/// Typed reads over a raw "read N bytes at X" primitive.
///
/// Implementors only provide [`ReadMemory::read_bytes`]. Every typed read
/// checks that the full width was returned and reports anything less as a
/// [`Error::ReadFault`].
pub trait ReadMemory {
    /// Read up to `size` bytes. Backends may return fewer bytes on fault.
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Advisory check that the target is still running.
    fn is_alive(&self) -> bool {
        true
    }

    /// Process id of the target, if there is one.
    fn pid(&self) -> Option<u32> {
        None
    }

    /// Read exactly `size` bytes or fail.
    fn read_exact(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        checked_offset(address, size as u64)?;
        let bytes = self.read_bytes(address, size)?;
        if bytes.len() < size {
            return Err(Error::short_read(address, size, bytes.len()));
        }
        Ok(bytes)
    }

    /// One bulk read decoded against `shape`.
    fn read(&self, address: u64, shape: &Shape) -> Result<Record> {
        let bytes = self.read_exact(address, shape.size())?;
        shape.decode(address, &bytes)
    }

    /// Single-field read returning the bare value.
    fn read_value(&self, address: u64, field: Field) -> Result<Value> {
        let bytes = self.read_exact(address, field.size())?;
        Shape::new(&[field]).decode(address, &bytes)?.get(0)
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        let bytes = self.read_exact(address, 1)?;
        Ok(bytes[0])
    }

    fn read_u16(&self, address: u64) -> Result<u16> {
        let bytes = self.read_exact(address, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_exact(address, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_exact(address, 4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_exact(address, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(address)?))
    }

    fn read_f64(&self, address: u64) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64(address)?))
    }

    fn read_bool(&self, address: u64) -> Result<bool> {
        Ok(self.read_u8(address)? != 0)
    }

    /// Read a pointer and reject null.
    fn read_ptr(&self, address: u64) -> Result<u64> {
        match self.read_u64(address)? {
            0 => Err(Error::ReadFault {
                address,
                reason: FaultReason::NullPointer,
            }),
            ptr => Ok(ptr),
        }
    }

    /// Bulk read of `count` consecutive 64-bit values.
    fn read_u64_array(&self, address: u64, count: usize) -> Result<Vec<u64>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let bytes = self.read_exact(address, count * 8)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                u64::from_le_bytes(buf)
            })
            .collect())
    }

    /// Decode exactly `byte_len` bytes (clamped to [`MAX_STRING_BYTES`]).
    fn read_fixed_string(
        &self,
        address: u64,
        byte_len: usize,
        encoding: TextEncoding,
    ) -> Result<String> {
        let byte_len = byte_len.min(MAX_STRING_BYTES);
        if byte_len == 0 {
            return Ok(String::new());
        }
        let bytes = self.read_exact(address, byte_len)?;
        Ok(encoding.decode(&bytes))
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }

    fn pid(&self) -> Option<u32> {
        (**self).pid()
    }
}

/// Reads memory of an opened target process.
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessHandle {
        self.process
    }
}

impl ReadMemory for MemoryReader<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.process.read_bytes(address, size)
    }

    fn is_alive(&self) -> bool {
        self.process.is_alive()
    }

    fn pid(&self) -> Option<u32> {
        Some(self.process.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mock::MockMemoryBuilder;

    #[test]
    fn test_utf16_byte_len() {
        assert_eq!(utf16_byte_len(0), 0);
        assert_eq!(utf16_byte_len(1), 0);
        assert_eq!(utf16_byte_len(6), 10);
    }

    #[test]
    fn test_read_shape_short_read_is_fault() {
        // 8 readable bytes, shape needs 12
        let reader = MockMemoryBuilder::new().bytes(0x1000, &[0u8; 8]).build();
        let shape = Shape::from([Field::F32, Field::F32, Field::F32]);

        let err = reader.read(0x1000, &shape).unwrap_err();
        assert!(err.is_read_fault());
    }

    #[test]
    fn test_read_value_returns_bare_value() {
        let reader = MockMemoryBuilder::new().u16(0x20, 0xBEEF).build();
        assert_eq!(reader.read_value(0x20, Field::U16).unwrap(), Value::U16(0xBEEF));
    }

    #[test]
    fn test_checked_offset() {
        assert_eq!(checked_offset(0x1000, 0x18).unwrap(), 0x1018);
        assert!(checked_offset(u64::MAX - 4, 0x18).unwrap_err().is_read_fault());
    }

    #[test]
    fn test_read_wrapping_range_is_fault() {
        let reader = MockMemoryBuilder::new().build();
        assert!(reader.read_u64(u64::MAX - 4).unwrap_err().is_read_fault());
        assert_eq!(reader.read_count(), 0);
    }

    #[test]
    fn test_read_ptr_rejects_null() {
        let reader = MockMemoryBuilder::new().u64(0x100, 0).build();
        assert!(reader.read_ptr(0x100).unwrap_err().is_read_fault());
    }

    #[test]
    fn test_read_u64_array() {
        let reader = MockMemoryBuilder::new()
            .u64_array(0x500, &[0xA, 0xB, 0])
            .build();
        assert_eq!(reader.read_u64_array(0x500, 3).unwrap(), vec![0xA, 0xB, 0]);
        assert!(reader.read_u64_array(0x500, 4).is_err());
    }

    #[test]
    fn test_read_fixed_string_utf16_drops_trailing_null() {
        let reader = MockMemoryBuilder::new().utf16(0x2000, "Bob\0").build();

        let text = reader
            .read_fixed_string(0x2000, utf16_byte_len(4), TextEncoding::Utf16Le)
            .unwrap();
        assert_eq!(text, "Bob");

        // the read never touches the null pair
        assert_eq!(reader.bytes_read_at(0x2000), Some(6));
    }

    #[test]
    fn test_read_fixed_string_narrow() {
        let reader = MockMemoryBuilder::new().bytes(0x30, b"Skeleton_C").build();
        let text = reader
            .read_fixed_string(0x30, 10, TextEncoding::Narrow)
            .unwrap();
        assert_eq!(text, "Skeleton_C");
    }

    #[test]
    fn test_read_fixed_string_zero_length_reads_nothing() {
        let reader = MockMemoryBuilder::new().build();
        let text = reader
            .read_fixed_string(0xDEAD, 0, TextEncoding::Utf16Le)
            .unwrap();
        assert!(text.is_empty());
        assert_eq!(reader.read_count(), 0);
    }
}

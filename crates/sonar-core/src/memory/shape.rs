//! Declared read shapes.
//!
//! A [`Shape`] is the byte layout of one read: an ordered list of fields,
//! packed little-endian with no implicit alignment. Gaps are spelled out
//! with [`Field::Pad`].

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Bool,
    Pad(usize),
}

impl Field {
    pub const fn size(&self) -> usize {
        match self {
            Field::U8 | Field::I8 | Field::Bool => 1,
            Field::U16 | Field::I16 => 2,
            Field::U32 | Field::I32 | Field::F32 => 4,
            Field::U64 | Field::I64 | Field::F64 => 8,
            Field::Pad(n) => *n,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Option<Value> {
        let value = match self {
            Field::U8 => Value::U8(bytes[0]),
            Field::I8 => Value::I8(bytes[0] as i8),
            Field::Bool => Value::Bool(bytes[0] != 0),
            Field::U16 => Value::U16(u16::from_le_bytes(bytes.try_into().ok()?)),
            Field::I16 => Value::I16(i16::from_le_bytes(bytes.try_into().ok()?)),
            Field::U32 => Value::U32(u32::from_le_bytes(bytes.try_into().ok()?)),
            Field::I32 => Value::I32(i32::from_le_bytes(bytes.try_into().ok()?)),
            Field::F32 => Value::F32(f32::from_le_bytes(bytes.try_into().ok()?)),
            Field::U64 => Value::U64(u64::from_le_bytes(bytes.try_into().ok()?)),
            Field::I64 => Value::I64(i64::from_le_bytes(bytes.try_into().ok()?)),
            Field::F64 => Value::F64(f64::from_le_bytes(bytes.try_into().ok()?)),
            Field::Pad(_) => return None,
        };
        Some(value)
    }
}

/// A decoded field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
}

impl Value {
    /// Unsigned view of any unsigned integer field.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Signed view of any integer field that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v as i64),
            Value::U16(v) => Some(v as i64),
            Value::U32(v) => Some(v as i64),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    fields: Vec<Field>,
}

impl Shape {
    pub fn new(fields: &[Field]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    /// `count` copies of one field, e.g. an array of pointers.
    pub fn repeat(field: Field, count: usize) -> Self {
        Self {
            fields: vec![field; count],
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total byte length of the shape.
    pub fn size(&self) -> usize {
        self.fields.iter().map(Field::size).sum()
    }

    /// Decode `bytes` in field order. `address` is only used for error reporting.
    pub fn decode(&self, address: u64, bytes: &[u8]) -> Result<Record> {
        let size = self.size();
        if bytes.len() < size {
            return Err(Error::short_read(address, size, bytes.len()));
        }

        let mut values = Vec::with_capacity(self.fields.len());
        let mut pos = 0;
        for field in &self.fields {
            let end = pos + field.size();
            if let Some(value) = field.decode(&bytes[pos..end]) {
                values.push(value);
            } else if !matches!(field, Field::Pad(_)) {
                return Err(Error::decode(
                    address.wrapping_add(pos as u64),
                    format!("cannot decode {:?}", field),
                ));
            }
            pos = end;
        }

        Ok(Record { address, values })
    }
}

impl From<&[Field]> for Shape {
    fn from(fields: &[Field]) -> Self {
        Self::new(fields)
    }
}

impl<const N: usize> From<[Field; N]> for Shape {
    fn from(fields: [Field; N]) -> Self {
        Self::new(&fields)
    }
}

/// The ordered values of one shaped read (padding excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    address: u64,
    values: Vec<Value>,
}

impl Record {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.values.get(index).copied().ok_or_else(|| {
            Error::decode(
                self.address,
                format!("field {} out of range ({} fields)", index, self.values.len()),
            )
        })
    }

    pub fn u64(&self, index: usize) -> Result<u64> {
        let value = self.get(index)?;
        value
            .as_u64()
            .ok_or_else(|| self.mismatch(index, "unsigned integer", value))
    }

    pub fn i64(&self, index: usize) -> Result<i64> {
        let value = self.get(index)?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(index, "signed integer", value))
    }

    pub fn f64(&self, index: usize) -> Result<f64> {
        let value = self.get(index)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(index, "float", value))
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        let value = self.get(index)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "bool", value))
    }

    fn mismatch(&self, index: usize, wanted: &str, found: Value) -> Error {
        Error::decode(
            self.address,
            format!("field {} is {:?}, expected {}", index, found, wanted),
        )
    }
}

pub mod layout;
mod process;
mod reader;
pub mod shape;

#[cfg(test)]
pub mod mock;

pub use process::*;
pub use reader::{
    MAX_STRING_BYTES, MemoryReader, ReadMemory, TextEncoding, checked_offset, utf16_byte_len,
};
pub use shape::{Field, Record, Shape, Value};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};

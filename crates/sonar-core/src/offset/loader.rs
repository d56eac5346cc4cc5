use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::offset::OffsetsCollection;

pub fn load_offsets<P: AsRef<Path>>(path: P) -> Result<OffsetsCollection> {
    let content = fs::read_to_string(&path)?;
    let offsets: OffsetsCollection = serde_json::from_str(&content)?;
    if !offsets.is_valid() {
        return Err(Error::InvalidOffset(format!(
            "{} contains zero addresses",
            path.as_ref().display()
        )));
    }
    Ok(offsets)
}

pub fn save_offsets<P: AsRef<Path>>(path: P, offsets: &OffsetsCollection) -> Result<()> {
    let content = serde_json::to_string_pretty(offsets)?;
    fs::write(path, content)?;
    Ok(())
}

use serde::{Deserialize, Serialize};

/// Addresses of the two globals the radar starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetsCollection {
    pub version: String,
    /// Global holding the current world pointer
    pub world: u64,
    /// Name pool block table
    pub names: u64,
}

impl OffsetsCollection {
    pub fn is_valid(&self) -> bool {
        self.world != 0 && self.names != 0
    }
}

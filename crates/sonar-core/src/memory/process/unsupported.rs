use crate::error::{Error, Result};
use crate::memory::process::ModuleRegion;

pub(super) struct RawProcess;

impl RawProcess {
    pub(super) fn open(pid: u32) -> Result<Self> {
        Err(Error::ProcessOpenFailed(format!(
            "pid {}: process memory access is not supported on this platform",
            pid
        )))
    }

    pub(super) fn read_bytes(&self, _address: u64, _size: usize) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    pub(super) fn is_alive(&self) -> bool {
        false
    }

    pub(super) fn executable_region(&self, module: &str) -> Result<ModuleRegion> {
        Err(Error::ModuleNotFound(module.to_string()))
    }
}

pub(super) fn find_pid(name: &str) -> Result<u32> {
    Err(Error::ProcessNotFound(name.to_string()))
}

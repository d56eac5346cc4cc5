//! Target process discovery and raw memory access.
//!
//! Only this module talks to the operating system. Everything above it goes
//! through [`crate::memory::ReadMemory`].

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as platform;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use self::windows as platform;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod unsupported;
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
use unsupported as platform;

use tracing::debug;

use crate::error::Result;

/// Address range of a module's executable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRegion {
    pub start: u64,
    pub end: u64,
}

impl ModuleRegion {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end
    }
}

/// An opened target process.
pub struct ProcessHandle {
    pub pid: u32,
    inner: platform::RawProcess,
}

impl ProcessHandle {
    /// Open a process by id.
    pub fn open(pid: u32) -> Result<Self> {
        let inner = platform::RawProcess::open(pid)?;
        debug!("Opened process {}", pid);
        Ok(Self { pid, inner })
    }

    /// Find a process whose name matches `name` (or whose command line
    /// starts with a path ending in `name`) and open it.
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = platform::find_pid(name)?;
        Self::open(pid)
    }

    /// Raw read; returns fewer bytes than requested when part of the range
    /// is unreadable.
    pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.inner.read_bytes(address, size)
    }

    /// Non-destructive liveness probe.
    pub fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    /// Executable code region of `module`.
    pub fn executable_region(&self, module: &str) -> Result<ModuleRegion> {
        self.inner.executable_region(module)
    }
}

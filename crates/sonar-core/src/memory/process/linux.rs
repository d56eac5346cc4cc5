//! Linux backend: `process_vm_readv` and procfs.

use std::fs;
use std::io;

use crate::error::{Error, FaultReason, Result};
use crate::memory::process::ModuleRegion;

/// Reads larger than this are refused outright.
const MAX_READ_SIZE: usize = 0x1FFF_FFFF;

pub(super) struct RawProcess {
    pid: libc::pid_t,
}

impl RawProcess {
    pub(super) fn open(pid: u32) -> Result<Self> {
        let pid = libc::pid_t::try_from(pid)
            .map_err(|_| Error::ProcessOpenFailed(format!("invalid pid {}", pid)))?;
        let process = Self { pid };
        if !process.is_alive() {
            return Err(Error::ProcessNotFound(format!("pid {}", pid)));
        }
        Ok(process)
    }

    pub(super) fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }
        if size > MAX_READ_SIZE {
            return Err(Error::ReadFault {
                address,
                reason: FaultReason::Os(format!("refusing to read {} bytes", size)),
            });
        }

        let mut buffer = vec![0u8; size];
        let local = libc::iovec {
            iov_base: buffer.as_mut_ptr().cast(),
            iov_len: size,
        };
        let remote = libc::iovec {
            iov_base: address as usize as *mut libc::c_void,
            iov_len: size,
        };

        // SAFETY: `local` points at `buffer`, which is valid for `size` bytes
        // and outlives the call. The remote iovec is only interpreted by the
        // kernel in the target's address space.
        let nread = unsafe { libc::process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };

        if nread < 0 {
            return Err(Error::ReadFault {
                address,
                reason: FaultReason::Os(io::Error::last_os_error().to_string()),
            });
        }

        buffer.truncate(nread as usize);
        Ok(buffer)
    }

    pub(super) fn is_alive(&self) -> bool {
        // SAFETY: signal 0 performs only the existence and permission check.
        let rc = unsafe { libc::kill(self.pid, 0) };
        rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    pub(super) fn executable_region(&self, module: &str) -> Result<ModuleRegion> {
        let maps_path = format!("/proc/{}/maps", self.pid);
        let maps = fs::read_to_string(&maps_path)?;
        find_executable_region(&maps, module)
            .ok_or_else(|| Error::ModuleNotFound(format!("executable region of {}", module)))
    }
}

/// Locate a process by `comm` name or by the first command line argument.
pub(super) fn find_pid(name: &str) -> Result<u32> {
    for entry in fs::read_dir("/proc")? {
        let Ok(entry) = entry else { continue };
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };

        let comm = fs::read_to_string(entry.path().join("comm")).unwrap_or_default();
        if comm.trim_end() == name {
            return Ok(pid);
        }

        let cmdline = fs::read(entry.path().join("cmdline")).unwrap_or_default();
        if let Some(arg0) = cmdline.split(|&b| b == 0).next()
            && !arg0.is_empty()
            && String::from_utf8_lossy(arg0).ends_with(name)
        {
            return Ok(pid);
        }
    }

    Err(Error::ProcessNotFound(name.to_string()))
}

/// First executable mapping at or after the module's read-only header mapping.
fn find_executable_region(maps: &str, module: &str) -> Option<ModuleRegion> {
    let mut seen_module = false;

    for line in maps.lines() {
        // "7f1234567000-7f123456a000 r-xp 00000000 08:01 123456 /path/to/module"
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        let perms = parts[1];
        let path = parts.get(5).copied().unwrap_or("");

        if !seen_module && path.ends_with(module) && perms == "r--p" {
            seen_module = true;
        }

        if seen_module && perms.as_bytes().get(2) == Some(&b'x') {
            let (start, end) = parts[0].split_once('-')?;
            return Some(ModuleRegion {
                start: u64::from_str_radix(start, 16).ok()?,
                end: u64::from_str_radix(end, 16).ok()?,
            });
        }
    }

    None
}

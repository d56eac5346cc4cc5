//! Windows backend: `ReadProcessMemory` and Toolhelp snapshots.

use std::ffi::c_void;

use windows::Win32::Foundation::{CloseHandle, HANDLE, STILL_ACTIVE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, PROCESSENTRY32W,
    Process32FirstW, Process32NextW, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ,
};

use crate::error::{Error, FaultReason, Result};
use crate::memory::process::ModuleRegion;

pub(super) struct RawProcess {
    pid: u32,
    handle: HANDLE,
}

impl RawProcess {
    pub(super) fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess has no memory-safety preconditions; the
        // returned handle is owned by `RawProcess` and closed on drop.
        let handle =
            unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }
                .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;
        Ok(Self { pid, handle })
    }

    pub(super) fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; size];
        let mut read = 0usize;

        // SAFETY: `buffer` is valid for `size` bytes; `read` receives the
        // number of bytes actually copied.
        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as usize as *const c_void,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut read as *mut usize),
            )
        };

        if let Err(e) = result
            && read == 0
        {
            return Err(Error::ReadFault {
                address,
                reason: FaultReason::Os(e.to_string()),
            });
        }

        buffer.truncate(read);
        Ok(buffer)
    }

    pub(super) fn is_alive(&self) -> bool {
        let mut code = 0u32;
        // SAFETY: `self.handle` stays open for the lifetime of `self`.
        let ok = unsafe { GetExitCodeProcess(self.handle, &mut code) }.is_ok();
        ok && code == STILL_ACTIVE.0 as u32
    }

    pub(super) fn executable_region(&self, module: &str) -> Result<ModuleRegion> {
        // SAFETY: snapshot handle is closed before returning.
        let snapshot =
            unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, self.pid) }
                .map_err(|e| Error::ModuleNotFound(format!("{}: {}", module, e)))?;

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        // SAFETY: `entry.dwSize` is initialized as the API requires.
        let mut has_entry = unsafe { Module32FirstW(snapshot, &mut entry) }.is_ok();
        while has_entry {
            if wide_to_string(&entry.szModule).eq_ignore_ascii_case(module) {
                let start = entry.modBaseAddr as usize as u64;
                found = Some(ModuleRegion {
                    start,
                    end: start + entry.modBaseSize as u64,
                });
                break;
            }
            // SAFETY: same snapshot and entry as above.
            has_entry = unsafe { Module32NextW(snapshot, &mut entry) }.is_ok();
        }

        // SAFETY: closing the snapshot handle we created.
        let _ = unsafe { CloseHandle(snapshot) };

        found.ok_or_else(|| Error::ModuleNotFound(module.to_string()))
    }
}

impl Drop for RawProcess {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by OpenProcess and is closed once.
        let _ = unsafe { CloseHandle(self.handle) };
    }
}

pub(super) fn find_pid(name: &str) -> Result<u32> {
    // SAFETY: snapshot handle is closed before returning.
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map_err(|e| Error::ProcessNotFound(format!("{}: {}", name, e)))?;

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut found = None;
    // SAFETY: `entry.dwSize` is initialized as the API requires.
    let mut has_entry = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
    while has_entry {
        if wide_to_string(&entry.szExeFile).eq_ignore_ascii_case(name) {
            found = Some(entry.th32ProcessID);
            break;
        }
        // SAFETY: same snapshot and entry as above.
        has_entry = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
    }

    // SAFETY: closing the snapshot handle we created.
    let _ = unsafe { CloseHandle(snapshot) };

    found.ok_or_else(|| Error::ProcessNotFound(name.to_string()))
}

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

#![cfg_attr(
    not(any(target_os = "windows", target_os = "linux")),
    allow(dead_code)
)]

use crate::error::{Error, Result};
use crate::process::region::{MemoryRegionList, RegionInventory};

#[cfg(target_os = "linux")]
use std::fs::{self, File};
#[cfg(target_os = "linux")]
use std::io::ErrorKind;

#[cfg(target_os = "linux")]
use crate::process::region::parse_proc_maps;

#[cfg(target_os = "windows")]
use crate::process::region::{MemoryRegionInfo, Permissions};
#[cfg(target_os = "windows")]
use tracing::warn;
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{CloseHandle, HANDLE};
#[cfg(target_os = "windows")]
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_EXECUTE, PAGE_EXECUTE_READ,
    PAGE_EXECUTE_READWRITE, PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOACCESS, PAGE_READONLY,
    PAGE_READWRITE, PAGE_WRITECOPY, VirtualQueryEx,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

/// An open, readable handle to another process (or this one).
///
/// The handle is owned by the caller; scans only borrow it.
#[cfg(target_os = "windows")]
pub struct ProcessHandle {
    handle: HANDLE,
    pid: u32,
}

#[cfg(target_os = "linux")]
pub struct ProcessHandle {
    mem: File,
    pid: u32,
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub struct ProcessHandle {
    pid: u32,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess is called with valid flags (PROCESS_QUERY_INFORMATION | PROCESS_VM_READ).
        // The returned handle is managed by this struct and closed in Drop.
        let handle = unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid).map_err(|e| {
                tracing::debug!("OpenProcess failed for PID {}: {}", pid, e);
                Error::ProcessOpenFailed(e.to_string())
            })?
        };
        tracing::debug!("Opened process {}", pid);

        Ok(Self { handle, pid })
    }

    pub fn handle(&self) -> HANDLE {
        self.handle
    }

    /// Check if the process is still running
    pub fn is_alive(&self) -> bool {
        const STILL_ACTIVE: u32 = 259;

        let mut exit_code: u32 = 0;
        // SAFETY: GetExitCodeProcess is called with a valid process handle obtained from OpenProcess.
        // The exit_code variable is properly initialized and passed by mutable reference.
        unsafe {
            if GetExitCodeProcess(self.handle, &mut exit_code).is_ok() {
                exit_code == STILL_ACTIVE
            } else {
                false
            }
        }
    }

    fn query(&self, address: u64) -> Option<MEMORY_BASIC_INFORMATION> {
        let mut info = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: VirtualQueryEx writes at most size_of::<MEMORY_BASIC_INFORMATION>() bytes
        // into `info`, and the handle was opened with PROCESS_QUERY_INFORMATION.
        let written = unsafe {
            VirtualQueryEx(
                self.handle,
                Some(address as *const _),
                &mut info,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        (written != 0).then_some(info)
    }

    /// Start of the region following the one that contains `address`.
    pub(crate) fn next_region_start(&self, address: u64) -> Option<u64> {
        let info = self.query(address)?;
        let next = (info.BaseAddress as u64).saturating_add(info.RegionSize as u64);
        (next > address).then_some(next)
    }
}

#[cfg(target_os = "windows")]
impl RegionInventory for ProcessHandle {
    fn regions(&self) -> Result<MemoryRegionList> {
        let mut regions = Vec::new();
        let mut address = 0u64;

        while let Some(info) = self.query(address) {
            let base = info.BaseAddress as u64;
            let size = info.RegionSize as u64;
            if info.State == MEM_COMMIT {
                regions.push(MemoryRegionInfo::new(
                    base,
                    size,
                    windows_permissions(info.Protect.0),
                    String::new(),
                ));
            }

            match base.checked_add(size) {
                Some(next) if next > address => address = next,
                _ => break,
            }
        }

        if regions.is_empty() {
            return Err(Error::RegionQueryFailed(format!(
                "No committed regions found in process {}",
                self.pid
            )));
        }
        Ok(MemoryRegionList::new(regions))
    }
}

#[cfg(target_os = "windows")]
fn windows_permissions(protect: u32) -> Permissions {
    let any = |flags: &[u32]| flags.iter().any(|&flag| protect & flag != 0);
    let blocked = any(&[PAGE_NOACCESS.0, PAGE_GUARD.0]);

    Permissions {
        read: !blocked
            && any(&[
                PAGE_READONLY.0,
                PAGE_READWRITE.0,
                PAGE_WRITECOPY.0,
                PAGE_EXECUTE_READ.0,
                PAGE_EXECUTE_READWRITE.0,
                PAGE_EXECUTE_WRITECOPY.0,
            ]),
        write: any(&[
            PAGE_READWRITE.0,
            PAGE_WRITECOPY.0,
            PAGE_EXECUTE_READWRITE.0,
            PAGE_EXECUTE_WRITECOPY.0,
        ]),
        execute: any(&[
            PAGE_EXECUTE.0,
            PAGE_EXECUTE_READ.0,
            PAGE_EXECUTE_READWRITE.0,
            PAGE_EXECUTE_WRITECOPY.0,
        ]),
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: self.handle is a valid handle obtained from OpenProcess and has not been
            // closed yet. CloseHandle is safe to call on a valid handle.
            if let Err(e) = unsafe { CloseHandle(self.handle) } {
                warn!("Failed to close process handle: {}", e);
            }
        }
    }
}

#[cfg(target_os = "linux")]
impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self> {
        let path = format!("/proc/{}/mem", pid);
        let mem = File::open(&path).map_err(|e| {
            tracing::debug!("Opening {} failed: {}", path, e);
            match e.kind() {
                ErrorKind::NotFound => Error::ProcessNotFound(format!("No process with PID {}", pid)),
                _ => Error::ProcessOpenFailed(e.to_string()),
            }
        })?;
        tracing::debug!("Opened process {}", pid);

        Ok(Self { mem, pid })
    }

    pub(crate) fn mem(&self) -> &File {
        &self.mem
    }

    /// Check if the process is still running
    pub fn is_alive(&self) -> bool {
        fs::metadata(format!("/proc/{}", self.pid)).is_ok()
    }
}

#[cfg(target_os = "linux")]
impl RegionInventory for ProcessHandle {
    fn regions(&self) -> Result<MemoryRegionList> {
        let content = fs::read_to_string(format!("/proc/{}/maps", self.pid))
            .map_err(|e| Error::RegionQueryFailed(e.to_string()))?;
        parse_proc_maps(&content)
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
impl ProcessHandle {
    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "process access not supported on this platform".to_string(),
        ))
    }

    /// Check if the process is still running (stub for unsupported platforms)
    pub fn is_alive(&self) -> bool {
        false
    }

    pub(crate) fn next_region_start(&self, _address: u64) -> Option<u64> {
        None
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
impl RegionInventory for ProcessHandle {
    fn regions(&self) -> Result<MemoryRegionList> {
        Err(Error::RegionQueryFailed(
            "region enumeration not supported on this platform".to_string(),
        ))
    }
}

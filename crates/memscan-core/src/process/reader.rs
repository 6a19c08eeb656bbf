#![cfg_attr(
    not(any(target_os = "windows", target_os = "linux")),
    allow(dead_code, unused_variables)
)]

#[cfg(target_os = "linux")]
use tracing::debug;
use tracing::trace;

use crate::error::{Error, Result};
use crate::process::ProcessHandle;

#[cfg(target_os = "linux")]
use std::os::unix::fs::FileExt;
#[cfg(target_os = "linux")]
use std::sync::OnceLock;

#[cfg(target_os = "linux")]
use crate::process::region::{MemoryRegionList, RegionInventory};

#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

/// Trait for reading memory from a process or buffer
///
/// This trait enables mocking for tests and abstracts over different memory sources.
/// Short reads are part of the contract: a reader that hits the end of a mapping
/// returns the bytes it could copy instead of failing the whole request.
pub trait ReadMemory {
    /// Read up to `buffer.len()` bytes starting at `address`.
    ///
    /// Returns the number of bytes copied into the front of `buffer`. An error
    /// or `Ok(0)` means the byte at `address` itself is unreadable.
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize>;

    /// Read up to `max_len` bytes from memory at the given address
    fn read_bytes(&self, address: u64, max_len: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; max_len];
        let read = self.read_into(address, &mut buffer)?;
        buffer.truncate(read.min(max_len));
        Ok(buffer)
    }

    /// Address of the next byte worth trying after `address` turned out unreadable.
    ///
    /// `None` means the reader does not know, and the caller picks its own step.
    /// A hint at or below `address` is ignored.
    fn skip_hint(&self, _address: u64) -> Option<u64> {
        None
    }
}

impl<R: ReadMemory + ?Sized> ReadMemory for &R {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        (**self).read_into(address, buffer)
    }

    fn skip_hint(&self, address: u64) -> Option<u64> {
        (**self).skip_hint(address)
    }
}

/// Reads the memory of a live process through an open [`ProcessHandle`].
///
/// On Linux the region map backing skip hints is read once, on the first
/// unreadable address, and reused for the reader's lifetime. Create a new
/// reader to pick up mapping changes.
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
    #[cfg(target_os = "linux")]
    regions: OnceLock<Option<MemoryRegionList>>,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self {
            process,
            #[cfg(target_os = "linux")]
            regions: OnceLock::new(),
        }
    }

    pub fn process(&self) -> &ProcessHandle {
        self.process
    }

    #[cfg(target_os = "windows")]
    fn read_into_impl(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        let mut bytes_read = 0;

        // SAFETY: ReadProcessMemory is called with:
        // - A valid process handle from ProcessHandle (obtained via OpenProcess with PROCESS_VM_READ)
        // - An address within the target process's address space
        // - A caller-owned buffer of exactly `buffer.len()` bytes
        // - A pointer to receive the actual bytes read
        let result = unsafe {
            ReadProcessMemory(
                self.process.handle(),
                address as *const _,
                buffer.as_mut_ptr() as *mut _,
                buffer.len(),
                Some(&mut bytes_read),
            )
        };

        match result {
            Ok(()) => Ok(bytes_read),
            // ERROR_PARTIAL_COPY still reports how far the copy got.
            Err(_) if bytes_read > 0 => Ok(bytes_read),
            Err(e) => Err(Error::read_failed(address, e.to_string())),
        }
    }

    #[cfg(target_os = "linux")]
    fn read_into_impl(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        self.process
            .mem()
            .read_at(buffer, address)
            .map_err(|e| Error::read_failed(address, e.to_string()))
    }

    #[cfg(target_os = "linux")]
    fn skip_hint_impl(&self, address: u64) -> Option<u64> {
        self.regions
            .get_or_init(|| match self.process.regions() {
                Ok(regions) => Some(regions),
                Err(e) => {
                    debug!("No region snapshot for process {}: {}", self.process.pid(), e);
                    None
                }
            })
            .as_ref()
            .map(|regions| regions.next_readable_after(address))
    }

    #[cfg(not(target_os = "linux"))]
    fn skip_hint_impl(&self, address: u64) -> Option<u64> {
        self.process.next_region_start(address)
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    fn read_into_impl(&self, address: u64, _buffer: &mut [u8]) -> Result<usize> {
        Err(Error::read_failed(
            address,
            "memory reading not supported on this platform",
        ))
    }
}

impl ReadMemory for MemoryReader<'_> {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        let read = self.read_into_impl(address, buffer)?;
        trace!(
            "read {:#x}: requested {} bytes, got {}",
            address,
            buffer.len(),
            read
        );
        Ok(read)
    }

    fn skip_hint(&self, address: u64) -> Option<u64> {
        self.skip_hint_impl(address)
    }
}

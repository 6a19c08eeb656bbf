//! Pattern search over the memory of a live process.
//!
//! The engine borrows a [`ReadMemory`] implementation, walks a caller-chosen
//! [`AddressRange`] in overlapping chunks, and reports the lowest address
//! where a byte pattern occurs at the requested alignment. Unreadable gaps are
//! skipped; only a range with no readable byte at all is an error.

pub mod config;
pub mod error;
pub mod process;
pub mod scan;

pub use config::ScanConfig;
pub use error::{Error, Result, ScanError};
pub use process::{
    MemoryReader, MemoryRegionInfo, MemoryRegionList, Permissions, ProcessHandle, ReadMemory,
    RegionInventory,
};
pub use scan::{AddressRange, CancellationToken, ChunkedScanner, MemoryScanner, find_in_memory};

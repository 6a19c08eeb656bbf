//! Mock memory reader for testing
//!
//! Provides a configurable mock implementation of the ReadMemory trait
//! that reads from an in-memory buffer instead of a real process. Holes and
//! page-limited reads let tests reproduce the sparse, partially readable
//! address spaces a live process presents.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::process::ReadMemory;
use crate::process::region::{MemoryRegionInfo, MemoryRegionList, Permissions, RegionInventory};

/// Mock memory reader for testing
///
/// Bytes live at `base..base + len`. Anything outside that span, or inside a
/// hole, fails to read.
#[derive(Debug, Default)]
pub struct MockMemoryReader {
    data: Vec<u8>,
    base: u64,
    holes: Vec<Range<usize>>,
    page_size: Option<usize>,
    reads: AtomicUsize,
}

impl MockMemoryReader {
    /// Create a new mock reader with the given data at base address 0x1000
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_base(data, 0x1000)
    }

    /// Create a new mock reader with custom base address
    pub fn with_base(data: Vec<u8>, base: u64) -> Self {
        Self {
            data,
            base,
            ..Default::default()
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Get the size of the underlying buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of `read_into` calls made so far, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn offset_of(&self, address: u64) -> Option<usize> {
        let offset = usize::try_from(address.checked_sub(self.base)?).ok()?;
        (offset < self.data.len()).then_some(offset)
    }

    fn hole_at(&self, offset: usize) -> Option<&Range<usize>> {
        self.holes.iter().find(|hole| hole.contains(&offset))
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        let offset = self.offset_of(address).ok_or_else(|| {
            Error::read_failed(
                address,
                format!(
                    "Out of bounds: base=0x{:X}, len={}",
                    self.base,
                    self.data.len()
                ),
            )
        })?;
        if self.hole_at(offset).is_some() {
            return Err(Error::read_failed(address, "Unreadable hole"));
        }

        let mut limit = self.data.len();
        if let Some(next_hole) = self
            .holes
            .iter()
            .map(|hole| hole.start)
            .filter(|&start| start > offset)
            .min()
        {
            limit = limit.min(next_hole);
        }
        if let Some(page) = self.page_size {
            let to_boundary = page - (address % page as u64) as usize;
            limit = limit.min(offset + to_boundary);
        }

        let count = buffer.len().min(limit - offset);
        buffer[..count].copy_from_slice(&self.data[offset..offset + count]);
        Ok(count)
    }

    fn skip_hint(&self, address: u64) -> Option<u64> {
        if address < self.base {
            return Some(self.base);
        }
        let Some(offset) = self.offset_of(address) else {
            return Some(u64::MAX);
        };
        self.hole_at(offset).map(|hole| self.base + hole.end as u64)
    }
}

impl RegionInventory for MockMemoryReader {
    /// Readable extents between holes, named `mock`.
    fn regions(&self) -> Result<MemoryRegionList> {
        let mut regions = Vec::new();
        let mut start = 0;

        while start < self.data.len() {
            if let Some(hole) = self.hole_at(start) {
                start = hole.end;
                continue;
            }
            let end = self
                .holes
                .iter()
                .map(|hole| hole.start)
                .filter(|&s| s > start)
                .min()
                .unwrap_or(self.data.len())
                .min(self.data.len());
            regions.push(MemoryRegionInfo::new(
                self.base + start as u64,
                (end - start) as u64,
                Permissions::new(true, true, false),
                "mock",
            ));
            start = end;
        }

        Ok(MemoryRegionList::new(regions))
    }
}

/// Builder for creating test memory buffers
///
/// Provides a fluent API for constructing memory layouts for testing.
#[derive(Debug, Clone)]
pub struct MockMemoryBuilder {
    data: Vec<u8>,
    base: u64,
    holes: Vec<Range<usize>>,
    page_size: Option<usize>,
}

impl Default for MockMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMemoryBuilder {
    /// Create a new builder with default base address (0x1000)
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            base: 0x1000,
            holes: Vec::new(),
            page_size: None,
        }
    }

    /// Set the base address for the mock reader
    pub fn base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    /// Pre-allocate buffer with zeros up to the specified size
    pub fn with_size(mut self, size: usize) -> Self {
        self.data.resize(size, 0);
        self
    }

    /// Fill `len` bytes at `offset` with `value`
    pub fn fill(mut self, offset: usize, len: usize, value: u8) -> Self {
        self.ensure_size(offset + len);
        self.data[offset..offset + len].fill(value);
        self
    }

    /// Write raw bytes at the specified offset from base
    pub fn write_bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.ensure_size(offset + bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Mark `len` bytes at `offset` as unreadable. Bytes written there stay
    /// in the buffer but can never be observed through a read.
    pub fn unreadable(mut self, offset: usize, len: usize) -> Self {
        self.ensure_size(offset + len);
        if len > 0 {
            self.holes.push(offset..offset + len);
        }
        self
    }

    /// Stop every read at the next multiple of `page_size`, the way a
    /// page-granular backend returns short reads.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Build the MockMemoryReader
    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            data: self.data,
            base: self.base,
            holes: self.holes,
            page_size: self.page_size,
            reads: AtomicUsize::new(0),
        }
    }

    fn ensure_size(&mut self, required: usize) {
        if self.data.len() < required {
            self.data.resize(required, 0);
        }
    }
}

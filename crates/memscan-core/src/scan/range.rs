use std::fmt;

use serde::{Deserialize, Serialize};

use crate::process::MemoryRegionInfo;

/// Half-open address interval `[base, base + size)`.
///
/// Construction does not validate; `Default` yields the empty range at 0,
/// which every scan rejects rather than treating as "whole address space".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    pub base: u64,
    pub size: u64,
}

impl AddressRange {
    pub const fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    /// Range covering `start..end`. An inverted pair yields an empty range.
    pub const fn from_bounds(start: u64, end: u64) -> Self {
        Self {
            base: start,
            size: end.saturating_sub(start),
        }
    }

    /// Exclusive end address, or `None` if `base + size` overflows.
    pub const fn end(&self) -> Option<u64> {
        self.base.checked_add(self.size)
    }

    /// Non-empty and representable in 64 bits.
    pub const fn is_valid(&self) -> bool {
        self.size > 0 && self.end().is_some()
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address - self.base < self.size
    }
}

impl From<&MemoryRegionInfo> for AddressRange {
    fn from(region: &MemoryRegionInfo) -> Self {
        region.range()
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end() {
            Some(end) => write!(f, "[{:#x}, {:#x})", self.base, end),
            None => write!(f, "[{:#x}, +{:#x})", self.base, self.size),
        }
    }
}

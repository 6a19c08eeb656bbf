//! Memory region inventory.
//!
//! Regions are informational: the scanner never consults them to decide
//! whether an address is readable. Callers use them to pick ranges worth
//! scanning, and live readers use them to skip past unmapped gaps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scan::AddressRange;

/// Access permissions of a mapped region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permissions {
    pub const fn new(read: bool, write: bool, execute: bool) -> Self {
        Self {
            read,
            write,
            execute,
        }
    }

    /// Parse the leading `rwx` triple of a permission string such as `r-xp`.
    pub fn from_rwx(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() < 3 {
            return None;
        }
        let flag = |byte: u8, set: u8| match byte {
            b'-' => Some(false),
            b if b == set => Some(true),
            _ => None,
        };
        Some(Self {
            read: flag(bytes[0], b'r')?,
            write: flag(bytes[1], b'w')?,
            execute: flag(bytes[2], b'x')?,
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
        )
    }
}

/// One mapped region of the inspected process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegionInfo {
    pub base: u64,
    pub size: u64,
    pub permissions: Permissions,
    /// Backing file or pseudo-name such as `[heap]`; empty for anonymous mappings.
    pub name: String,
}

impl MemoryRegionInfo {
    pub fn new(base: u64, size: u64, permissions: Permissions, name: impl Into<String>) -> Self {
        Self {
            base,
            size,
            permissions,
            name: name.into(),
        }
    }

    pub fn range(&self) -> AddressRange {
        AddressRange::new(self.base, self.size)
    }

    /// Exclusive end address, saturating at the top of the address space.
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    pub fn is_readable(&self) -> bool {
        self.permissions.read
    }
}

/// Ordered snapshot of a process's mapped regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRegionList {
    regions: Vec<MemoryRegionInfo>,
}

impl MemoryRegionList {
    /// Build a list, ordering regions by base address.
    pub fn new(mut regions: Vec<MemoryRegionInfo>) -> Self {
        regions.sort_by_key(|r| r.base);
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MemoryRegionInfo> {
        self.regions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemoryRegionInfo> {
        self.regions.iter()
    }

    pub fn region_containing(&self, address: u64) -> Option<&MemoryRegionInfo> {
        self.regions.iter().find(|r| r.contains(address))
    }

    /// Ranges of every readable, non-empty region, in address order.
    pub fn readable_ranges(&self) -> impl Iterator<Item = AddressRange> + '_ {
        self.regions
            .iter()
            .filter(|r| r.is_readable() && r.size > 0)
            .map(MemoryRegionInfo::range)
    }

    /// Base of the first readable region starting after `address`.
    ///
    /// Returns `u64::MAX` when nothing readable follows.
    pub fn next_readable_after(&self, address: u64) -> u64 {
        self.regions
            .iter()
            .find(|r| r.is_readable() && r.base > address)
            .map_or(u64::MAX, |r| r.base)
    }
}

impl IntoIterator for MemoryRegionList {
    type Item = MemoryRegionInfo;
    type IntoIter = std::vec::IntoIter<MemoryRegionInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

impl<'a> IntoIterator for &'a MemoryRegionList {
    type Item = &'a MemoryRegionInfo;
    type IntoIter = std::slice::Iter<'a, MemoryRegionInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

impl FromIterator<MemoryRegionInfo> for MemoryRegionList {
    fn from_iter<I: IntoIterator<Item = MemoryRegionInfo>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Trait for enumerating the mapped regions of a process.
///
/// This trait abstracts region discovery, allowing mock implementations
/// that don't require actual system processes.
pub trait RegionInventory {
    /// Snapshot the current region list.
    fn regions(&self) -> Result<MemoryRegionList>;

    /// Find the region containing `address`, if any.
    fn region_containing(&self, address: u64) -> Result<Option<MemoryRegionInfo>> {
        Ok(self.regions()?.region_containing(address).cloned())
    }
}

/// Parse the contents of a Linux `/proc/<pid>/maps` file.
///
/// Each line reads `start-end perms offset dev inode [name]`.
pub fn parse_proc_maps(content: &str) -> Result<MemoryRegionList> {
    let mut regions = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(span), Some(perms)) = (fields.next(), fields.next()) else {
            return Err(Error::RegionQueryFailed(format!("Malformed maps line: '{}'", line)));
        };
        // offset, dev, inode
        let name = fields.skip(3).collect::<Vec<_>>().join(" ");

        let (start, end) = span
            .split_once('-')
            .and_then(|(s, e)| {
                Some((
                    u64::from_str_radix(s, 16).ok()?,
                    u64::from_str_radix(e, 16).ok()?,
                ))
            })
            .ok_or_else(|| Error::RegionQueryFailed(format!("Bad address span: '{}'", span)))?;
        let permissions = Permissions::from_rwx(perms)
            .ok_or_else(|| Error::RegionQueryFailed(format!("Bad permissions: '{}'", perms)))?;

        regions.push(MemoryRegionInfo::new(
            start,
            end.saturating_sub(start),
            permissions,
            name,
        ));
    }

    Ok(MemoryRegionList::new(regions))
}

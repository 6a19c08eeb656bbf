//! Sentinel-address boundary for callers that cannot express `Option`.
//!
//! This adaptation is lossy: "not found" and every error both map to
//! [`INVALID_ADDRESS`]. The error travels separately in
//! [`RawFindResult::error`], so a caller that checks it can still tell the
//! two apart. Code inside this crate keeps the typed result.

use crate::error::ScanError;
use crate::process::ReadMemory;
use crate::scan::{AddressRange, MemoryScanner};

/// Reserved address meaning "no address".
pub const INVALID_ADDRESS: u64 = u64::MAX;

/// Address plus status, as returned across the sentinel boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFindResult {
    pub address: u64,
    pub error: Option<ScanError>,
}

impl RawFindResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_found(&self) -> bool {
        self.is_success() && self.address != INVALID_ADDRESS
    }
}

impl From<Result<Option<u64>, ScanError>> for RawFindResult {
    fn from(result: Result<Option<u64>, ScanError>) -> Self {
        match result {
            Ok(found) => Self {
                address: found.unwrap_or(INVALID_ADDRESS),
                error: None,
            },
            Err(e) => Self {
                address: INVALID_ADDRESS,
                error: Some(e),
            },
        }
    }
}

/// Run a scan and collapse the outcome onto the sentinel convention.
pub fn find_in_memory_raw<R: ReadMemory>(
    scanner: &MemoryScanner<'_, R>,
    pattern: &[u8],
    range: AddressRange,
    alignment: u64,
) -> RawFindResult {
    scanner.find(pattern, range, alignment).into()
}

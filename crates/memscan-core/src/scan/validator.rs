//! Structural request checks, run before any memory is touched.

use crate::error::ScanError;
use crate::scan::AddressRange;

/// Reject malformed requests. The first failing check wins:
/// pattern, then range, then alignment.
pub fn validate(pattern: &[u8], range: AddressRange, alignment: u64) -> Result<(), ScanError> {
    if pattern.is_empty() {
        return Err(ScanError::EmptyPattern);
    }
    if !range.is_valid() {
        return Err(ScanError::InvalidRange {
            base: range.base,
            size: range.size,
        });
    }
    if alignment == 0 {
        return Err(ScanError::InvalidAlignment);
    }
    Ok(())
}

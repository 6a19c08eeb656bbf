//! Pattern search over a process address space.
//!
//! [`MemoryScanner::find`] is the entry point: it validates the request,
//! then hands it to the [`ChunkedScanner`]. A rejected request never reaches
//! the reader.

pub mod cancel;
pub mod chunked;
pub mod compat;
pub mod pattern;
mod range;
pub mod validator;

pub use cancel::CancellationToken;
pub use chunked::ChunkedScanner;
pub use range::AddressRange;

use tracing::debug;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::process::ReadMemory;

/// Public scan operation over a borrowed reader.
///
/// Holds no state between calls; the reader is only borrowed for the
/// scanner's lifetime.
///
/// # Example
///
/// ```
/// use memscan_core::process::MockMemoryBuilder;
/// use memscan_core::scan::{AddressRange, MemoryScanner};
///
/// let reader = MockMemoryBuilder::new()
///     .with_size(16)
///     .write_bytes(8, b"AB")
///     .build();
///
/// let scanner = MemoryScanner::new(&reader);
/// let found = scanner.find(b"AB", AddressRange::new(0x1000, 16), 8).unwrap();
/// assert_eq!(found, Some(0x1008));
/// ```
pub struct MemoryScanner<'a, R: ReadMemory> {
    reader: &'a R,
    config: ScanConfig,
    cancellation: Option<CancellationToken>,
}

impl<'a, R: ReadMemory> MemoryScanner<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            config: ScanConfig::default(),
            cancellation: None,
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Find the lowest address in `range` aligned to `alignment` where `pattern` occurs.
    ///
    /// `Ok(None)` means the range was scanned and holds no aligned match.
    pub fn find(
        &self,
        pattern: &[u8],
        range: AddressRange,
        alignment: u64,
    ) -> Result<Option<u64>, ScanError> {
        if let Err(e) = validator::validate(pattern, range, alignment) {
            debug!("Rejected scan request: {}", e);
            return Err(e);
        }

        debug!(
            "Scanning {} for {} byte pattern (alignment {})",
            range,
            pattern.len(),
            alignment
        );
        let mut scanner = ChunkedScanner::new(self.reader, self.config);
        if let Some(token) = &self.cancellation {
            scanner = scanner.with_cancellation(token);
        }

        let result = scanner.scan(pattern, range, alignment);
        match &result {
            Ok(Some(address)) => debug!("Pattern found at {:#x}", address),
            Ok(None) => debug!("Pattern not found in {}", range),
            Err(e) => debug!("Scan failed: {}", e),
        }
        result
    }
}

/// Scan with default configuration and no cancellation.
pub fn find_in_memory<R: ReadMemory>(
    reader: &R,
    pattern: &[u8],
    range: AddressRange,
    alignment: u64,
) -> Result<Option<u64>, ScanError> {
    MemoryScanner::new(reader).find(pattern, range, alignment)
}

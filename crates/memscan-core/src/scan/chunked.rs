//! Chunked scanning over a live address space.
//!
//! The target cannot be read wholesale: it may be huge, sparsely mapped, and
//! every read may cost a syscall. The scanner walks the range with one reused
//! buffer, carrying the last `pattern.len() - 1` bytes of each chunk into the
//! next so matches that straddle a chunk boundary are still seen.

use tracing::{debug, trace};

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::process::ReadMemory;
use crate::scan::cancel::CancellationToken;
use crate::scan::pattern::find_first_aligned;
use crate::scan::{AddressRange, validator};

/// Drives a [`ReadMemory`] across a range and reports the lowest aligned match.
pub struct ChunkedScanner<'a, R: ReadMemory> {
    reader: &'a R,
    config: ScanConfig,
    cancellation: Option<&'a CancellationToken>,
}

impl<'a, R: ReadMemory> ChunkedScanner<'a, R> {
    /// Create a new chunked scanner.
    ///
    /// # Arguments
    ///
    /// * `reader` - The memory reader to use
    /// * `config` - Chunk size and skip granularity (clamped to usable values)
    pub fn new(reader: &'a R, config: ScanConfig) -> Self {
        Self {
            reader,
            config: config.validated(),
            cancellation: None,
        }
    }

    /// Create a new chunked scanner with default configuration.
    pub fn with_default_config(reader: &'a R) -> Self {
        Self::new(reader, ScanConfig::default())
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Find the lowest `a` in `range` with `a % alignment == 0` where `pattern` occurs.
    ///
    /// Unreadable stretches are skipped. `Unreadable` is returned only when no
    /// byte of the range could be read at all.
    pub fn scan(
        &self,
        pattern: &[u8],
        range: AddressRange,
        alignment: u64,
    ) -> Result<Option<u64>, ScanError> {
        // Malformed requests must never turn into wrapped arithmetic below.
        validator::validate(pattern, range, alignment)?;
        let end = range.end().ok_or(ScanError::InvalidRange {
            base: range.base,
            size: range.size,
        })?;

        let pattern_len = pattern.len() as u64;
        if pattern_len > range.size {
            return Ok(None);
        }

        let capacity = self.config.chunk_size.max(pattern.len().saturating_mul(2));
        let overlap = pattern.len() - 1;
        let mut buffer = vec![0u8; capacity];
        // Bytes at the front of `buffer` carried over from the previous chunk,
        // covering `frontier - retained..frontier`.
        let mut retained = 0usize;
        let mut frontier = range.base;
        let mut any_readable = false;

        while frontier < end {
            if self.is_cancelled() {
                debug!("Scan of {} cancelled at {:#x}", range, frontier);
                return Err(ScanError::Cancelled);
            }

            let window_start = frontier - retained as u64;
            // A short tail can still decide Unreadable vs not found.
            if end - window_start < pattern_len && any_readable {
                break;
            }

            let remaining = usize::try_from(end - frontier).unwrap_or(usize::MAX);
            let want = (capacity - retained).min(remaining);
            let read = match self
                .reader
                .read_into(frontier, &mut buffer[retained..retained + want])
            {
                Ok(read) => read.min(want),
                Err(e) => {
                    trace!("{}", e);
                    0
                }
            };

            if read == 0 {
                let next = self.skip_target(frontier, end)?;
                debug!("Skipping unreadable {:#x}..{:#x}", frontier, next);
                // Carried bytes cannot complete a match across an unreadable gap.
                retained = 0;
                frontier = next;
                continue;
            }
            any_readable = true;
            trace!("Chunk {:#x}: {} new bytes, {} carried", frontier, read, retained);

            let available = retained + read;
            if let Some(offset) =
                find_first_aligned(&buffer[..available], window_start, pattern, alignment)
            {
                return Ok(Some(window_start + offset as u64));
            }

            frontier += read as u64;
            let keep = overlap.min(available);
            buffer.copy_within(available - keep..available, 0);
            retained = keep;
        }

        if any_readable {
            Ok(None)
        } else {
            Err(ScanError::Unreadable {
                base: range.base,
                size: range.size,
            })
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_some_and(CancellationToken::is_cancelled)
    }

    /// Next address to try after `address` failed to read.
    ///
    /// Always strictly greater than `address` and never past `end`. A reader
    /// hint is trusted as-is. Without one, probe forward with doubling strides
    /// (capped at `skip_granularity`) until a byte reads, then bisect back to
    /// the first readable byte after the last failed probe.
    fn skip_target(&self, address: u64, end: u64) -> Result<u64, ScanError> {
        if let Some(hint) = self.reader.skip_hint(address).filter(|&hint| hint > address) {
            return Ok(hint.min(end));
        }

        let last = end - 1;
        let mut unreadable = address;
        let mut stride = 1u64;
        let mut readable = loop {
            if self.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if unreadable >= last {
                return Ok(end);
            }
            let probe = unreadable.saturating_add(stride).min(last);
            if self.is_readable(probe) {
                break probe;
            }
            unreadable = probe;
            stride = stride.saturating_mul(2).min(self.config.skip_granularity);
        };

        while readable - unreadable > 1 {
            let mid = unreadable + (readable - unreadable) / 2;
            if self.is_readable(mid) {
                readable = mid;
            } else {
                unreadable = mid;
            }
        }
        Ok(readable)
    }

    fn is_readable(&self, address: u64) -> bool {
        let mut byte = [0u8; 1];
        matches!(self.reader.read_into(address, &mut byte), Ok(read) if read > 0)
    }
}

//! Scan configuration.
//!
//! This module contains the tunables for the chunked scanner:
//! - Chunk and skip-granularity constants
//! - `ScanConfig`, loadable from a JSON file
//!
//! None of these values affect which address a scan reports, only how many
//! reads it takes to get there.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Chunked scanning constants.
pub mod scan {
    /// Default bytes requested per read (64KB).
    ///
    /// Reads may cross into a ptrace- or syscall-backed target, so each call
    /// is assumed to be slow; larger chunks amortize that cost.
    pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    /// Smallest chunk size accepted from configuration.
    pub const MIN_CHUNK_SIZE: usize = 16;

    /// Default cap on the probe stride across unreadable memory when the
    /// reader gives no hint.
    pub const DEFAULT_SKIP_GRANULARITY: u64 = 4096;
}

/// Tunables for a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Bytes requested per read. The scanner widens this when the pattern
    /// would not otherwise fit alongside the retained overlap.
    pub chunk_size: usize,
    /// Largest stride between probes over unreadable memory when the reader
    /// has no hint. 1 probes every byte.
    pub skip_granularity: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: scan::DEFAULT_CHUNK_SIZE,
            skip_granularity: scan::DEFAULT_SKIP_GRANULARITY,
        }
    }
}

impl ScanConfig {
    pub fn new(chunk_size: usize, skip_granularity: u64) -> Self {
        Self {
            chunk_size,
            skip_granularity,
        }
    }

    /// Clamp values into the ranges the scanner can work with.
    pub fn validated(self) -> Self {
        Self {
            chunk_size: self.chunk_size.max(scan::MIN_CHUNK_SIZE),
            skip_granularity: self.skip_granularity.max(1),
        }
    }

    /// Load config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse config from JSON content. Missing fields fall back to defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::ConfigParseError(e.to_string()))?;
        Ok(config.validated())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

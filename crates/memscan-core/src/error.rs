use thiserror::Error;

/// Outcome classification for a failed scan.
///
/// "Not found" is not an error: `find` reports it as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Search pattern is empty")]
    EmptyPattern,

    #[error("Invalid address range: base {base:#x}, size {size:#x}")]
    InvalidRange { base: u64, size: u64 },

    #[error("Alignment must be at least 1")]
    InvalidAlignment,

    #[error("Address range {base:#x}..+{size:#x} is entirely unreadable")]
    Unreadable { base: u64, size: u64 },

    #[error("Scan cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to query memory regions: {0}")]
    RegionQueryFailed(String),

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn read_failed(address: u64, message: impl Into<String>) -> Self {
        Self::MemoryReadFailed {
            address,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

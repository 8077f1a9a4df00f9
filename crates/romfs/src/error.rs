//! ROMFS error types

use thiserror::Error;

/// Errors returned by ROMFS lookups
///
/// Callers that only care whether a file is available can treat every
/// variant the same way. The variants stay distinct for diagnostics.
#[derive(Debug, Error)]
pub enum RomfsError {
    /// No entry with this exact path exists in the table
    #[error("file not found: {0}")]
    NotFound(String),

    /// The output buffer could not be reserved
    #[error("allocation of {size} bytes failed")]
    AllocationFailure {
        /// Number of bytes requested (including the terminator)
        size: usize,
    },

    /// The stored blob is not a valid compressed file
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// The decompressed content does not match the stored CRC32
    #[error("integrity check failed: expected crc {expected:08x}, got {actual:08x}")]
    IntegrityFailure {
        /// CRC32 recorded in the table
        expected: u32,
        /// CRC32 of the decompressed, filtered content
        actual: u32,
    },
}

impl RomfsError {
    /// Whether this error means the name is simply absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for ROMFS operations
pub type RomfsResult<T> = Result<T, RomfsError>;

//! Frame Error Types

use thiserror::Error;

/// Errors raised when building or parsing a frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Length code above the classic CAN limit
    #[error("Invalid DLC {0}: must be 0-8")]
    InvalidDlc(u8),

    /// Identifier does not fit in 29 bits
    #[error("Identifier {0:#X} exceeds the 29-bit extended range")]
    InvalidId(u32),

    /// Payload slice longer than the declared capacity
    #[error("Payload of {0} bytes exceeds 8-byte frame capacity")]
    PayloadTooLong(usize),

    /// Wire buffer shorter than one encoded frame
    #[error("Truncated wire frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

//! Frame Source Error Types

use can_frame::FrameError;
use thiserror::Error;

/// Errors a frame source can report
#[derive(Debug, Error)]
pub enum SourceError {
    /// Identifier range is empty or exceeds 29 bits
    #[error("Invalid identifier range {min:#X}-{max:#X}")]
    InvalidIdRange { min: u32, max: u32 },

    /// A replay source ran out of recorded frames
    #[error("Frame source exhausted")]
    Exhausted,

    /// The remote end closed the connection
    #[error("Frame source disconnected")]
    Disconnected,

    /// Malformed frame received or generated
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::ConnectionReset => {
                SourceError::Disconnected
            }
            _ => SourceError::Io(err.to_string()),
        }
    }
}

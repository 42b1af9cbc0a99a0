//! Frame Sources
//!
//! Everything that can feed raw frames into the processing pipeline. A source
//! is a blocking producer of one frame per call; it may sleep to pace itself.

mod error;
mod mock;
mod replay;
mod wire;

pub use error::SourceError;
pub use mock::{MockCanSource, DEFAULT_FRAME_RATE, DEFAULT_ID_RANGE};
pub use replay::ReplaySource;
pub use wire::{TcpFrameSource, WireSource};

use can_frame::CanFrame;

/// A blocking producer of frames
pub trait FrameSource: Send {
    /// Return the next frame, blocking until one is available
    fn next_frame(&mut self) -> Result<CanFrame, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<CanFrame, SourceError> {
        (**self).next_frame()
    }
}

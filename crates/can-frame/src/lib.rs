//! CAN Frame Model
//!
//! Defines the raw bus frame shared by every stage of the monitor, the
//! identifier limits for standard and extended addressing, and the fixed-width
//! binary layout used when frames cross a process boundary.

mod error;
mod frame;
mod wire;

pub use error::FrameError;
pub use frame::CanFrame;
pub use wire::WIRE_FRAME_SIZE;

/// Maximum number of payload bytes in a classic CAN frame
pub const MAX_DLC: u8 = 8;

/// Identifier limits per addressing width
pub mod id {
    /// Largest 11-bit (standard) identifier
    pub const STANDARD_MAX: u32 = 0x7FF;
    /// Largest 29-bit (extended) identifier
    pub const EXTENDED_MAX: u32 = 0x1FFF_FFFF;

    /// Check whether an identifier fits the standard 11-bit range
    pub fn is_standard(id: u32) -> bool {
        id <= STANDARD_MAX
    }

    /// Check whether an identifier fits any supported addressing width
    pub fn is_valid(id: u32) -> bool {
        id <= EXTENDED_MAX
    }
}

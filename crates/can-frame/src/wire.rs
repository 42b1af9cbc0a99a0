//! Fixed-Width Wire Layout
//!
//! Frames travel as 24 little-endian bytes, matching the natural C layout of
//! `{ u32 id; u8 dlc; u8 data[8]; u64 timestamp; }`:
//!
//! | offset | size | field          |
//! |--------|------|----------------|
//! | 0      | 4    | id             |
//! | 4      | 1    | dlc            |
//! | 5      | 8    | data           |
//! | 13     | 3    | padding (zero) |
//! | 16     | 8    | timestamp (µs) |

use crate::error::FrameError;
use crate::frame::CanFrame;

/// Size of one encoded frame in bytes
pub const WIRE_FRAME_SIZE: usize = 24;

const DLC_OFFSET: usize = 4;
const DATA_OFFSET: usize = 5;
const TIMESTAMP_OFFSET: usize = 16;

impl CanFrame {
    /// Encode into the 24-byte wire layout
    pub fn to_wire(&self) -> [u8; WIRE_FRAME_SIZE] {
        let mut buf = [0u8; WIRE_FRAME_SIZE];
        buf[..DLC_OFFSET].copy_from_slice(&self.id().to_le_bytes());
        buf[DLC_OFFSET] = self.dlc();
        buf[DATA_OFFSET..DATA_OFFSET + 8].copy_from_slice(self.raw_data());
        buf[TIMESTAMP_OFFSET..].copy_from_slice(&self.timestamp_us().to_le_bytes());
        buf
    }

    /// Decode one frame from the start of `buf`.
    ///
    /// Padding bytes are ignored. Bytes beyond the first 24 are left for the
    /// caller.
    pub fn from_wire(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < WIRE_FRAME_SIZE {
            return Err(FrameError::Truncated {
                expected: WIRE_FRAME_SIZE,
                actual: buf.len(),
            });
        }

        let id = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let dlc = buf[DLC_OFFSET];
        let mut data = [0u8; 8];
        data.copy_from_slice(&buf[DATA_OFFSET..DATA_OFFSET + 8]);
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&buf[TIMESTAMP_OFFSET..WIRE_FRAME_SIZE]);

        Self::from_parts(id, dlc, data, u64::from_le_bytes(ts))
    }
}

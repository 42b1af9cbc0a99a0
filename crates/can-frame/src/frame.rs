//! CAN Frame Value Type

use crate::error::FrameError;
use crate::{id, MAX_DLC};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single frame of bus traffic.
///
/// Frames are plain `Copy` values; once produced nothing mutates them. Only
/// the first `dlc` payload bytes are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct CanFrame {
    id: u32,
    dlc: u8,
    data: [u8; 8],
    timestamp_us: u64,
}

/// Unchecked field set; deserialized frames are validated through it
#[derive(Deserialize)]
struct RawFrame {
    id: u32,
    dlc: u8,
    data: [u8; 8],
    timestamp_us: u64,
}

impl TryFrom<RawFrame> for CanFrame {
    type Error = FrameError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        Self::from_parts(raw.id, raw.dlc, raw.data, raw.timestamp_us)
    }
}

impl CanFrame {
    /// Build a frame from a payload slice; `dlc` is taken from the slice length
    pub fn new(id: u32, payload: &[u8], timestamp_us: u64) -> Result<Self, FrameError> {
        if payload.len() > MAX_DLC as usize {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }
        let mut data = [0u8; 8];
        data[..payload.len()].copy_from_slice(payload);
        Self::from_parts(id, payload.len() as u8, data, timestamp_us)
    }

    /// Build a frame from raw fields, validating the id and length code
    pub fn from_parts(
        id: u32,
        dlc: u8,
        data: [u8; 8],
        timestamp_us: u64,
    ) -> Result<Self, FrameError> {
        if dlc > MAX_DLC {
            return Err(FrameError::InvalidDlc(dlc));
        }
        if !id::is_valid(id) {
            return Err(FrameError::InvalidId(id));
        }
        Ok(Self {
            id,
            dlc,
            data,
            timestamp_us,
        })
    }

    /// Bus identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of valid payload bytes (0-8)
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// The meaningful part of the payload
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.dlc as usize]
    }

    /// The full 8-byte payload buffer, including bytes past `dlc`
    pub fn raw_data(&self) -> &[u8; 8] {
        &self.data
    }

    /// Capture timestamp in microseconds
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    /// Whether the identifier needs 29-bit addressing
    pub fn is_extended(&self) -> bool {
        !id::is_standard(self.id)
    }
}

/// Monitor line format: `timestamp µs | ID | [dlc] bytes`
impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} µs | {:03X} | [{}]", self.timestamp_us, self.id, self.dlc)?;
        for byte in self.payload() {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pads_payload() {
        let frame = CanFrame::new(0x100, &[0x01, 0x90], 42).unwrap();
        assert_eq!(frame.dlc(), 2);
        assert_eq!(frame.payload(), &[0x01, 0x90]);
        assert_eq!(frame.raw_data(), &[0x01, 0x90, 0, 0, 0, 0, 0, 0]);
        assert_eq!(frame.timestamp_us(), 42);
    }

    #[test]
    fn test_rejects_long_payload() {
        let err = CanFrame::new(0x100, &[0; 9], 0).unwrap_err();
        assert_eq!(err, FrameError::PayloadTooLong(9));
    }

    #[test]
    fn test_rejects_bad_dlc_and_id() {
        assert_eq!(
            CanFrame::from_parts(0x100, 9, [0; 8], 0).unwrap_err(),
            FrameError::InvalidDlc(9)
        );
        assert_eq!(
            CanFrame::from_parts(0x2000_0000, 8, [0; 8], 0).unwrap_err(),
            FrameError::InvalidId(0x2000_0000)
        );
    }

    #[test]
    fn test_extended_id() {
        let standard = CanFrame::new(0x7FF, &[], 0).unwrap();
        let extended = CanFrame::new(0x800, &[], 0).unwrap();
        assert!(!standard.is_extended());
        assert!(extended.is_extended());
    }

    #[test]
    fn test_deserialize_validates_fields() {
        let frame: CanFrame = serde_json::from_str(
            r#"{"id":256,"dlc":2,"data":[1,144,0,0,0,0,0,0],"timestamp_us":5}"#,
        )
        .unwrap();
        assert_eq!(frame, CanFrame::new(0x100, &[0x01, 0x90], 5).unwrap());

        let bad_dlc = serde_json::from_str::<CanFrame>(
            r#"{"id":256,"dlc":12,"data":[1,2,3,4,5,6,7,8],"timestamp_us":0}"#,
        );
        assert!(bad_dlc.unwrap_err().to_string().contains("Invalid DLC 12"));

        let bad_id = serde_json::from_str::<CanFrame>(
            r#"{"id":536870912,"dlc":0,"data":[0,0,0,0,0,0,0,0],"timestamp_us":0}"#,
        );
        assert!(bad_id.is_err());
    }

    #[test]
    fn test_serialize_round_trips_through_validation() {
        let frame = CanFrame::new(0x7FF, &[0xAB; 8], 99).unwrap();
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(serde_json::from_str::<CanFrame>(&json).unwrap(), frame);
    }

    #[test]
    fn test_display_format() {
        let frame = CanFrame::new(0x101, &[0xAB, 0x01, 0x0F], 200_000).unwrap();
        assert_eq!(frame.to_string(), "200000 µs | 101 | [3] ab 01 0f");
    }
}

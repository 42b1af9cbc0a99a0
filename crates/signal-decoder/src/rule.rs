//! Signal Rule Definitions

use can_frame::CanFrame;
use serde::Serialize;

/// Vehicle speed frame identifier
pub const SPEED_ID: u32 = 0x100;

/// Engine speed frame identifier
pub const RPM_ID: u32 = 0x101;

/// Byte order of a multi-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteOrder {
    /// Most significant byte first
    BigEndian,
    /// Least significant byte first
    LittleEndian,
}

/// Extraction rule for one 16-bit signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalRule {
    /// Frame identifier carrying the signal
    pub id: u32,
    /// Signal name
    pub name: &'static str,
    /// Engineering unit
    pub unit: &'static str,
    /// Offset of the first byte of the field
    pub start_byte: usize,
    /// Field byte order
    pub byte_order: ByteOrder,
    /// Physical value per raw count
    pub scale: f64,
}

impl SignalRule {
    /// Minimum DLC needed to extract this signal
    pub fn min_dlc(&self) -> usize {
        self.start_byte + 2
    }

    /// Raw 16-bit field, or `None` if the frame is too short
    pub fn extract_raw(&self, frame: &CanFrame) -> Option<u16> {
        let payload = frame.payload();
        if payload.len() < self.min_dlc() {
            return None;
        }
        let pair = [payload[self.start_byte], payload[self.start_byte + 1]];
        Some(match self.byte_order {
            ByteOrder::BigEndian => u16::from_be_bytes(pair),
            ByteOrder::LittleEndian => u16::from_le_bytes(pair),
        })
    }

    /// Physical value, `NaN` if the frame is too short
    pub fn physical_value(&self, frame: &CanFrame) -> f64 {
        match self.extract_raw(frame) {
            Some(raw) => raw as f64 * self.scale,
            None => f64::NAN,
        }
    }
}

/// The two built-in rules
pub const REFERENCE_RULES: [SignalRule; 2] = [
    // Speed: bytes 0-1 big-endian, 0.1 km/h per count
    SignalRule {
        id: SPEED_ID,
        name: "VehicleSpeed",
        unit: "km/h",
        start_byte: 0,
        byte_order: ByteOrder::BigEndian,
        scale: 0.1,
    },
    // RPM: bytes 2-3 little-endian, 0.25 RPM per count
    SignalRule {
        id: RPM_ID,
        name: "EngineRPM",
        unit: "RPM",
        start_byte: 2,
        byte_order: ByteOrder::LittleEndian,
        scale: 0.25,
    },
];

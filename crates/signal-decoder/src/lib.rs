//! Signal Decoding
//!
//! Extracts named physical values from raw frames using a fixed table of
//! rules keyed by frame identifier. This is a lookup, not a bus-description
//! interpreter: each rule reads one 16-bit field and applies a linear scale.

mod decoder;
mod rule;

pub use decoder::{FrameDecoder, SignalDecoder};
pub use rule::{ByteOrder, SignalRule, REFERENCE_RULES, RPM_ID, SPEED_ID};

use serde::Serialize;

/// A decoded physical value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedSignal {
    /// Signal name (e.g. "VehicleSpeed")
    pub name: &'static str,
    /// Physical value; `NaN` when the frame was too short for the rule
    pub value: f64,
    /// Engineering unit (e.g. "km/h")
    pub unit: &'static str,
    /// Capture timestamp of the originating frame (µs)
    pub timestamp_us: u64,
}

impl DecodedSignal {
    /// Whether the value is usable (not the invalid sentinel)
    pub fn is_valid(&self) -> bool {
        !self.value.is_nan()
    }
}

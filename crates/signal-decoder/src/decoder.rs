//! Rule-Table Decoder

use crate::rule::{SignalRule, REFERENCE_RULES};
use crate::DecodedSignal;
use can_frame::CanFrame;
use tracing::debug;

/// Maps a frame to the signal it carries
pub trait FrameDecoder: Send {
    /// Decode `frame`; `None` means the identifier is not recognised
    fn decode(&self, frame: &CanFrame) -> Option<DecodedSignal>;
}

/// Decoder backed by a fixed table of [`SignalRule`]s
#[derive(Debug, Clone)]
pub struct SignalDecoder {
    rules: Vec<SignalRule>,
}

impl SignalDecoder {
    /// Create a decoder over a custom rule table.
    ///
    /// When two rules share an identifier the first one wins.
    pub fn new(rules: Vec<SignalRule>) -> Self {
        debug!("Signal decoder created with {} rules", rules.len());
        Self { rules }
    }

    /// Decoder with the built-in speed and RPM rules
    pub fn reference() -> Self {
        Self::new(REFERENCE_RULES.to_vec())
    }

    /// Rule registered for `id`, if any
    pub fn rule_for(&self, id: u32) -> Option<&SignalRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Identifiers this decoder recognises
    pub fn known_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.rules.iter().map(|rule| rule.id)
    }

    /// Decode vehicle speed with the built-in rule.
    ///
    /// `NaN` unless the frame is a speed frame with dlc >= 2.
    pub fn decode_speed(frame: &CanFrame) -> DecodedSignal {
        decode_with(&REFERENCE_RULES[0], frame)
    }

    /// Decode engine RPM with the built-in rule.
    ///
    /// `NaN` unless the frame is an RPM frame with dlc >= 4.
    pub fn decode_rpm(frame: &CanFrame) -> DecodedSignal {
        decode_with(&REFERENCE_RULES[1], frame)
    }
}

fn decode_with(rule: &SignalRule, frame: &CanFrame) -> DecodedSignal {
    let value = if frame.id() == rule.id {
        rule.physical_value(frame)
    } else {
        f64::NAN
    };
    signal(rule, value, frame)
}

impl Default for SignalDecoder {
    fn default() -> Self {
        Self::reference()
    }
}

impl FrameDecoder for SignalDecoder {
    fn decode(&self, frame: &CanFrame) -> Option<DecodedSignal> {
        let rule = self.rule_for(frame.id())?;
        Some(signal(rule, rule.physical_value(frame), frame))
    }
}

fn signal(rule: &SignalRule, value: f64, frame: &CanFrame) -> DecodedSignal {
    DecodedSignal {
        name: rule.name,
        value,
        unit: rule.unit,
        timestamp_us: frame.timestamp_us(),
    }
}

//! Signal Sinks
//!
//! The consumer reports every processed frame to a sink injected at
//! construction time.

use can_frame::CanFrame;
use signal_decoder::DecodedSignal;
use tracing::{debug, info, warn};

/// Receives the outcome of decoding each frame, in production order
pub trait SignalSink: Send {
    /// Called once per consumed frame; `signal` is `None` for unknown ids
    fn on_frame(&mut self, frame: &CanFrame, signal: Option<&DecodedSignal>);
}

impl<F> SignalSink for F
where
    F: FnMut(&CanFrame, Option<&DecodedSignal>) + Send,
{
    fn on_frame(&mut self, frame: &CanFrame, signal: Option<&DecodedSignal>) {
        self(frame, signal)
    }
}

/// Reports signals through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SignalSink for LogSink {
    fn on_frame(&mut self, frame: &CanFrame, signal: Option<&DecodedSignal>) {
        match signal {
            Some(signal) if signal.is_valid() => {
                info!("{}: {:.1} {}", signal.name, signal.value, signal.unit);
            }
            Some(signal) => {
                warn!(
                    "Invalid {} signal: id={:03X} dlc={}",
                    signal.name,
                    frame.id(),
                    frame.dlc()
                );
            }
            None => debug!("Unrecognized frame: id={:03X}", frame.id()),
        }
    }
}

/// Discards everything; for benchmarks and headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn on_frame(&mut self, _frame: &CanFrame, _signal: Option<&DecodedSignal>) {}
}

//! Run Counters and Reports

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters shared by both workers; reset at the start of every run
#[derive(Debug, Default)]
pub(crate) struct PipelineCounters {
    pub(crate) produced: AtomicU64,
    pub(crate) consumed: AtomicU64,
    pub(crate) batches: AtomicU64,
    pub(crate) decoded: AtomicU64,
    pub(crate) invalid: AtomicU64,
    pub(crate) unrecognized: AtomicU64,
}

impl PipelineCounters {
    pub(crate) fn reset(&self) {
        for counter in [
            &self.produced,
            &self.consumed,
            &self.batches,
            &self.decoded,
            &self.invalid,
            &self.unrecognized,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, pending_batches: usize) -> PipelineStats {
        PipelineStats {
            frames_produced: self.produced.load(Ordering::Relaxed),
            frames_consumed: self.consumed.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            signals_decoded: self.decoded.load(Ordering::Relaxed),
            invalid_signals: self.invalid.load(Ordering::Relaxed),
            unrecognized_frames: self.unrecognized.load(Ordering::Relaxed),
            pending_batches,
        }
    }
}

/// Point-in-time view of the counters of the current (or last) run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Frames pulled from the source
    pub frames_produced: u64,
    /// Frames passed through the decoder and sink
    pub frames_consumed: u64,
    /// Slots handed off to the consumer
    pub batches: u64,
    /// Frames that yielded a valid signal
    pub signals_decoded: u64,
    /// Frames with a recognised id but too short to decode
    pub invalid_signals: u64,
    /// Frames with an id the decoder does not know
    pub unrecognized_frames: u64,
    /// Batches published but not yet taken by the consumer
    pub pending_batches: usize,
}

/// Why production ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Target frame count reached
    Completed,
    /// A stop was requested before the target was reached
    Stopped,
    /// The frame source failed; production ended early
    SourceError(String),
}

/// Summary of one completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Requested number of frames
    pub target_frames: u64,
    /// Counters at the end of the run
    #[serde(flatten)]
    pub stats: PipelineStats,
    /// Wall time from start to both workers joined
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// How production ended
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Every produced frame was consumed
    pub fn is_lossless(&self) -> bool {
        self.stats.frames_produced == self.stats.frames_consumed
    }

    /// Consumed frames per second of wall time
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.stats.frames_consumed as f64 / secs
        } else {
            0.0
        }
    }
}

fn serialize_millis<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

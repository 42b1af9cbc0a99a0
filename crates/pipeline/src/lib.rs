//! Double-Buffered Frame Processing Pipeline
//!
//! Decouples frame acquisition from frame decoding. A producer thread fills
//! one buffer slot from a [`FrameSource`](frame_source::FrameSource) while a
//! consumer thread drains the previously filled slot through a
//! [`FrameDecoder`](signal_decoder::FrameDecoder) and reports each result to a
//! [`SignalSink`].
//!
//! Every produced frame is consumed exactly once and in production order,
//! including the final partial batch of a stopped run.

mod config;
mod handoff;
mod pipeline;
mod sink;
mod stats;
mod worker;

pub use config::{PipelineConfig, DEFAULT_BATCH_THRESHOLD, DEFAULT_SLOT_COUNT};
pub use pipeline::{ProcessingPipeline, StopHandle};
pub use sink::{LogSink, NullSink, SignalSink};
pub use stats::{PipelineStats, RunOutcome, RunReport};

use thiserror::Error;

/// Errors from the pipeline lifecycle
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `start` or `run` called while a run is in progress
    #[error("Pipeline is already running")]
    AlreadyRunning,

    /// `wait` called with no run in progress
    #[error("Pipeline is not running")]
    NotRunning,

    /// Rejected configuration
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A worker thread panicked
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),

    /// A collaborator was lost with a panicked worker; the pipeline cannot run again
    #[error("Pipeline is defunct after a worker failure")]
    Defunct,

    /// The OS refused to spawn a worker thread
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

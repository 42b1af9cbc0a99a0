//! Processing Pipeline Lifecycle
//!
//! Owns the collaborators between runs and moves them into the worker
//! threads for the duration of a run. Each thread hands its collaborators
//! back through its join handle, so the pipeline can be run again.

use crate::config::PipelineConfig;
use crate::handoff::Handoff;
use crate::sink::SignalSink;
use crate::stats::{PipelineCounters, PipelineStats, RunReport};
use crate::worker::{self, ProducerExit};
use crate::PipelineError;
use frame_source::FrameSource;
use signal_decoder::FrameDecoder;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{error, info, warn};

/// State shared by the pipeline and both workers
pub(crate) struct Shared {
    pub(crate) handoff: Handoff,
    pub(crate) counters: PipelineCounters,
}

type Consumed = (Box<dyn FrameDecoder>, Box<dyn SignalSink>);
type ProducerHandle = JoinHandle<Option<(Box<dyn FrameSource>, ProducerExit)>>;
type ConsumerHandle = JoinHandle<Option<Consumed>>;

/// Worker threads of the run in progress
struct ActiveRun {
    producer: ProducerHandle,
    consumer: ConsumerHandle,
    target: u64,
    started: Instant,
}

/// Double-buffered frame processing pipeline.
///
/// A producer thread pulls frames from the source into one slot while a
/// consumer thread decodes the previously filled slot. Dropping the pipeline
/// stops and joins both threads.
pub struct ProcessingPipeline {
    config: PipelineConfig,
    shared: Arc<Shared>,
    source: Option<Box<dyn FrameSource>>,
    decoder: Option<Box<dyn FrameDecoder>>,
    sink: Option<Box<dyn SignalSink>>,
    active: Option<ActiveRun>,
}

impl ProcessingPipeline {
    /// Create a pipeline, taking ownership of its collaborators
    pub fn new<S, D, K>(
        source: S,
        decoder: D,
        sink: K,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError>
    where
        S: FrameSource + 'static,
        D: FrameDecoder + 'static,
        K: SignalSink + 'static,
    {
        config.validate()?;
        info!(
            "Creating pipeline: {} slots, batch threshold {}",
            config.slot_count, config.batch_threshold
        );

        let shared = Arc::new(Shared {
            handoff: Handoff::new(config.slot_count, config.batch_threshold),
            counters: PipelineCounters::default(),
        });

        Ok(Self {
            config,
            shared,
            source: Some(Box::new(source)),
            decoder: Some(Box::new(decoder)),
            sink: Some(Box::new(sink)),
            active: None,
        })
    }

    /// Start both workers and block until they finish.
    ///
    /// Counters are reset at the start of every run.
    pub fn run(&mut self, target_frames: u64) -> Result<RunReport, PipelineError> {
        self.start(target_frames)?;
        self.wait()
    }

    /// Start both workers without waiting for them
    pub fn start(&mut self, target_frames: u64) -> Result<(), PipelineError> {
        if self.active.is_some() {
            return Err(PipelineError::AlreadyRunning);
        }
        let collaborators = (self.source.take(), self.decoder.take(), self.sink.take());
        let (source, decoder, sink) = match collaborators {
            (Some(source), Some(decoder), Some(sink)) => (source, decoder, sink),
            (source, decoder, sink) => {
                self.source = source;
                self.decoder = decoder;
                self.sink = sink;
                return Err(PipelineError::Defunct);
            }
        };

        info!(
            "Starting pipeline run: target {} frames over {} slots",
            target_frames,
            self.shared.handoff.slot_count()
        );
        self.shared.handoff.reset();
        self.shared.counters.reset();
        let started = Instant::now();

        let batch_capacity = self.config.batch_threshold;
        let consumer_shared = Arc::clone(&self.shared);
        let consumer = spawn_worker(
            thread::Builder::new().name("can-consumer".to_string()),
            (decoder, sink),
            move |(decoder, mut sink): Consumed| {
                worker::consume(
                    &consumer_shared,
                    decoder.as_ref(),
                    sink.as_mut(),
                    batch_capacity,
                );
                (decoder, sink)
            },
        );
        let consumer = match consumer {
            Ok(handle) => handle,
            Err(((decoder, sink), e)) => {
                self.source = Some(source);
                self.decoder = Some(decoder);
                self.sink = Some(sink);
                return Err(e.into());
            }
        };

        let producer_shared = Arc::clone(&self.shared);
        let producer = spawn_worker(
            thread::Builder::new().name("can-producer".to_string()),
            source,
            move |mut source: Box<dyn FrameSource>| {
                let exit = worker::produce(
                    &producer_shared,
                    source.as_mut(),
                    target_frames,
                    batch_capacity,
                );
                (source, exit)
            },
        );
        let producer = match producer {
            Ok(handle) => handle,
            Err((source, e)) => {
                self.source = Some(source);
                // No producer will ever finish production, so do it here to
                // let the consumer exit.
                self.shared.handoff.finish(0);
                if let Some((decoder, sink)) = consumer.join().ok().flatten() {
                    self.decoder = Some(decoder);
                    self.sink = Some(sink);
                }
                return Err(e.into());
            }
        };

        self.active = Some(ActiveRun {
            producer,
            consumer,
            target: target_frames,
            started,
        });
        Ok(())
    }

    /// Block until the current run finishes and return its report
    pub fn wait(&mut self) -> Result<RunReport, PipelineError> {
        let run = self.active.take().ok_or(PipelineError::NotRunning)?;

        let producer = run.producer.join().ok().flatten();
        let consumer = run.consumer.join().ok().flatten();
        let elapsed = run.started.elapsed();
        self.shared.handoff.clear_stop();

        let mut failed = None;
        let outcome = match producer {
            Some((source, exit)) => {
                self.source = Some(source);
                match exit {
                    ProducerExit::Finished(outcome) => Some(outcome),
                    ProducerExit::ConsumerGone => None,
                }
            }
            None => {
                error!("Producer thread panicked");
                failed = Some("producer");
                None
            }
        };
        match consumer {
            Some((decoder, sink)) => {
                self.decoder = Some(decoder);
                self.sink = Some(sink);
            }
            None => {
                error!("Consumer thread panicked");
                failed = failed.or(Some("consumer"));
            }
        }

        let stats = self.stats();
        let outcome = match (failed, outcome) {
            (Some(worker), _) => return Err(PipelineError::WorkerPanicked(worker)),
            (None, Some(outcome)) => outcome,
            (None, None) => return Err(PipelineError::WorkerPanicked("consumer")),
        };

        info!("Processing complete in {}ms", elapsed.as_millis());
        info!(
            "Frames produced: {}, consumed: {} ({} batches)",
            stats.frames_produced, stats.frames_consumed, stats.batches
        );
        if stats.frames_produced != stats.frames_consumed {
            warn!(
                "{} frames produced but not consumed",
                stats.frames_produced.saturating_sub(stats.frames_consumed)
            );
        }

        Ok(RunReport {
            target_frames: run.target,
            stats,
            elapsed,
            outcome,
        })
    }

    /// Request a cooperative stop and join the workers.
    ///
    /// Frames already pulled from the source are still decoded. Returns the
    /// report of the interrupted run, or `None` when idle. Idempotent.
    pub fn stop(&mut self) -> Result<Option<RunReport>, PipelineError> {
        if self.active.is_none() {
            return Ok(None);
        }
        info!("Stopping pipeline");
        self.shared.handoff.request_stop();
        self.wait().map(Some)
    }

    /// Handle for requesting a stop from another thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Live counters of the current run, or the final ones of the last run
    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot(self.shared.handoff.pending())
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Spawn a worker that receives its collaborators once the thread exists.
///
/// On failure the collaborators are handed back with the error. The handle
/// yields `None` only if the thread never received them.
fn spawn_worker<C, R, F>(
    builder: thread::Builder,
    collaborators: C,
    body: F,
) -> Result<JoinHandle<Option<R>>, (C, io::Error)>
where
    C: Send + 'static,
    R: Send + 'static,
    F: FnOnce(C) -> R + Send + 'static,
{
    let (handover, inbox) = mpsc::sync_channel::<C>(1);
    let handle = match builder.spawn(move || inbox.recv().ok().map(body)) {
        Ok(handle) => handle,
        Err(e) => return Err((collaborators, e)),
    };
    match handover.send(collaborators) {
        Ok(()) => Ok(handle),
        Err(mpsc::SendError(collaborators)) => Err((
            collaborators,
            io::Error::new(io::ErrorKind::Other, "worker exited before start"),
        )),
    }
}

impl Drop for ProcessingPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Pipeline shutdown failed: {}", e);
        }
    }
}

/// Cloneable handle that requests a stop without joining.
///
/// A stop applies to the run in progress. Requested while idle, it applies to
/// the next run to start. It is consumed when that run is joined.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Ask the producer to stop before its next frame
    pub fn request_stop(&self) {
        info!("Stop requested");
        self.shared.handoff.request_stop();
    }

    /// Whether a stop is pending for the current or next run
    pub fn is_stop_requested(&self) -> bool {
        self.shared.handoff.stop_requested()
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("stop_requested", &self.is_stop_requested())
            .finish()
    }
}

//! Producer and Consumer Workers

use crate::pipeline::Shared;
use crate::sink::SignalSink;
use crate::stats::{PipelineCounters, RunOutcome};
use frame_source::FrameSource;
use signal_decoder::FrameDecoder;
use tracing::{debug, error, info, trace};

/// How the producer loop ended
#[derive(Debug)]
pub(crate) enum ProducerExit {
    Finished(RunOutcome),
    ConsumerGone,
}

/// Marks production finished when dropped, including on panic, so the
/// consumer always gets the last partial batch and a termination signal.
struct ProductionGuard<'a> {
    shared: &'a Shared,
    current: usize,
}

impl Drop for ProductionGuard<'_> {
    fn drop(&mut self) {
        if self.shared.handoff.finish(self.current) {
            PipelineCounters::bump(&self.shared.counters.batches);
            debug!("Final partial batch handed off from slot {}", self.current);
        }
    }
}

/// Releases a producer blocked on a slot when the consumer exits
struct ConsumerGuard<'a> {
    shared: &'a Shared,
}

impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.shared.handoff.consumer_exited();
    }
}

/// Pull up to `target` frames from `source` into the slots
pub(crate) fn produce(
    shared: &Shared,
    source: &mut dyn FrameSource,
    target: u64,
    batch_threshold: usize,
) -> ProducerExit {
    info!("Producer started (target {} frames)", target);

    let mut guard = ProductionGuard { shared, current: 0 };
    let mut produced = 0u64;

    let exit = loop {
        if produced >= target {
            break ProducerExit::Finished(RunOutcome::Completed);
        }
        if shared.handoff.stop_requested() {
            info!("Producer stopping on request after {} frames", produced);
            break ProducerExit::Finished(RunOutcome::Stopped);
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Frame source failed after {} frames: {}", produced, e);
                break ProducerExit::Finished(RunOutcome::SourceError(e.to_string()));
            }
        };

        let filled = shared.handoff.append(guard.current, frame);
        produced += 1;
        PipelineCounters::bump(&shared.counters.produced);
        trace!("Produced frame id={:03X} ({}/{})", frame.id(), produced, target);

        if filled >= batch_threshold {
            match shared.handoff.publish(guard.current) {
                Some(next) => {
                    PipelineCounters::bump(&shared.counters.batches);
                    guard.current = next;
                }
                None => {
                    error!("Consumer exited early; abandoning production");
                    break ProducerExit::ConsumerGone;
                }
            }
        }
    };

    drop(guard);
    info!("Producer finished ({} frames)", produced);
    exit
}

/// Drain published slots through the decoder and sink until production ends
pub(crate) fn consume(
    shared: &Shared,
    decoder: &dyn FrameDecoder,
    sink: &mut dyn SignalSink,
    batch_capacity: usize,
) {
    info!("Consumer started");

    let _guard = ConsumerGuard { shared };
    let counters = &shared.counters;
    let mut batch = Vec::with_capacity(batch_capacity);
    let mut consumed = 0u64;

    while let Some(index) = shared.handoff.take(&mut batch) {
        debug!("Draining slot {} ({} frames)", index, batch.len());

        for frame in batch.drain(..) {
            let signal = decoder.decode(&frame);
            match &signal {
                Some(s) if s.is_valid() => PipelineCounters::bump(&counters.decoded),
                Some(_) => PipelineCounters::bump(&counters.invalid),
                None => PipelineCounters::bump(&counters.unrecognized),
            }
            sink.on_frame(&frame, signal.as_ref());
            PipelineCounters::bump(&counters.consumed);
            consumed += 1;
        }
    }

    info!("Consumer finished ({} frames)", consumed);
}

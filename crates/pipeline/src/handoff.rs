//! Slot Hand-Off State Machine
//!
//! The producer appends into its current slot and publishes the slot index
//! once the batch is complete. The consumer takes a published slot by swapping
//! its contents with an empty buffer, then drains the batch outside any lock.
//!
//! Invariants:
//! - the producer never appends to a slot whose index is in `ready`
//! - the consumer only touches a slot while holding the hand-off lock, and
//!   only one that was published
//! - slots are published and taken in FIFO order, so frames come out in the
//!   order they went in

use can_frame::CanFrame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// State guarded by the hand-off lock
#[derive(Debug)]
struct HandoffState {
    /// Published slot indices awaiting the consumer, oldest first
    ready: VecDeque<usize>,
    /// Set once the producer has made its final hand-off
    production_done: bool,
    /// Cleared when the consumer exits (normally or by panic)
    consumer_alive: bool,
}

/// Shared slots plus the synchronisation between producer and consumer
pub(crate) struct Handoff {
    /// Frame buffers, each behind its own lock
    slots: Box<[Mutex<Vec<CanFrame>>]>,
    /// Readiness tokens and lifecycle flags
    state: Mutex<HandoffState>,
    /// Consumer waits here for a ready slot or end of production
    ready_cv: Condvar,
    /// Producer waits here for its next slot to be taken
    free_cv: Condvar,
    /// Cooperative stop flag, polled by the producer before each frame
    stop: AtomicBool,
}

impl Handoff {
    /// Create `slot_count` empty slots, each pre-sized for one batch
    pub(crate) fn new(slot_count: usize, batch_capacity: usize) -> Self {
        let slots = (0..slot_count)
            .map(|_| Mutex::new(Vec::with_capacity(batch_capacity)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots,
            state: Mutex::new(HandoffState {
                ready: VecDeque::with_capacity(slot_count),
                production_done: false,
                consumer_alive: true,
            }),
            ready_cv: Condvar::new(),
            free_cv: Condvar::new(),
            stop: AtomicBool::new(false),
        }
    }

    /// Number of slots
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Return to the initial state before a new run.
    ///
    /// A pending stop request is kept so it applies to the run being started.
    /// Must only be called while no worker is running.
    pub(crate) fn reset(&self) {
        let mut state = lock(&self.state);
        state.ready.clear();
        state.production_done = false;
        state.consumer_alive = true;
        for slot in self.slots.iter() {
            lock(slot).clear();
        }
    }

    /// Append a frame to the producer's current slot, returning the new length
    pub(crate) fn append(&self, index: usize, frame: CanFrame) -> usize {
        let mut slot = lock(&self.slots[index]);
        slot.push(frame);
        slot.len()
    }

    /// Publish a full slot and move the producer to the next one.
    ///
    /// Blocks only while the next slot is still waiting to be taken. Returns
    /// `None` if the consumer is gone.
    pub(crate) fn publish(&self, index: usize) -> Option<usize> {
        let next = (index + 1) % self.slots.len();

        let mut state = lock(&self.state);
        state.ready.push_back(index);
        trace!("Slot {} ready ({} pending)", index, state.ready.len());
        self.ready_cv.notify_one();

        if state.ready.contains(&next) {
            debug!("Producer waiting for slot {} to be taken", next);
        }
        let state = self
            .free_cv
            .wait_while(state, |s| s.consumer_alive && s.ready.contains(&next))
            .unwrap_or_else(PoisonError::into_inner);

        if state.consumer_alive {
            Some(next)
        } else {
            None
        }
    }

    /// Final hand-off: publish `index` if it holds frames, then mark
    /// production finished. Returns whether a partial batch was published.
    pub(crate) fn finish(&self, index: usize) -> bool {
        let mut state = lock(&self.state);
        let partial = !lock(&self.slots[index]).is_empty() && !state.ready.contains(&index);
        if partial {
            state.ready.push_back(index);
        }
        state.production_done = true;
        self.ready_cv.notify_all();
        partial
    }

    /// Wait for the next published slot and swap its frames into `batch`.
    ///
    /// `batch` must be empty; it is replaced by the slot's frames and the slot
    /// receives the old (empty, still allocated) buffer. Returns the slot
    /// index, or `None` once production is finished and nothing is pending.
    pub(crate) fn take(&self, batch: &mut Vec<CanFrame>) -> Option<usize> {
        debug_assert!(batch.is_empty());

        let state = lock(&self.state);
        let mut state = self
            .ready_cv
            .wait_while(state, |s| s.ready.is_empty() && !s.production_done)
            .unwrap_or_else(PoisonError::into_inner);

        let index = state.ready.pop_front()?;
        std::mem::swap(&mut *lock(&self.slots[index]), batch);
        self.free_cv.notify_one();
        Some(index)
    }

    /// Record that the consumer has exited and release a waiting producer
    pub(crate) fn consumer_exited(&self) {
        let mut state = lock(&self.state);
        state.consumer_alive = false;
        self.free_cv.notify_all();
    }

    /// Ask the producer to stop before its next frame
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Take the lock so a waiter cannot miss the notification between
        // checking its predicate and parking.
        let _state = lock(&self.state);
        self.ready_cv.notify_all();
        self.free_cv.notify_all();
    }

    /// Consume a stop request once the run it applied to has been joined
    pub(crate) fn clear_stop(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }

    /// Whether a stop has been requested for the current run
    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Number of slots published but not yet taken
    pub(crate) fn pending(&self) -> usize {
        lock(&self.state).ready.len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Critical sections never call out to user code, so the data behind a
    // poisoned lock is still consistent.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    fn frame(ts: u64) -> CanFrame {
        CanFrame::new(0x100, &[ts as u8], ts).unwrap()
    }

    #[test]
    fn test_publish_and_take_in_order() {
        let handoff = Handoff::new(2, 4);
        handoff.append(0, frame(1));
        handoff.append(0, frame(2));
        assert_eq!(handoff.publish(0), Some(1));
        assert_eq!(handoff.pending(), 1);

        let mut batch = Vec::new();
        assert_eq!(handoff.take(&mut batch), Some(0));
        let stamps: Vec<u64> = batch.iter().map(|f| f.timestamp_us()).collect();
        assert_eq!(stamps, vec![1, 2]);
        assert_eq!(handoff.pending(), 0);
    }

    #[test]
    fn test_take_leaves_slot_empty_with_capacity() {
        let handoff = Handoff::new(2, 8);
        handoff.append(0, frame(1));
        handoff.publish(0);

        let mut batch = Vec::with_capacity(16);
        handoff.take(&mut batch);
        let slot = lock(&handoff.slots[0]);
        assert!(slot.is_empty());
        assert!(slot.capacity() >= 16);
    }

    #[test]
    fn test_finish_publishes_partial_batch() {
        let handoff = Handoff::new(2, 4);
        handoff.append(0, frame(1));
        assert!(handoff.finish(0));

        let mut batch = Vec::new();
        assert_eq!(handoff.take(&mut batch), Some(0));
        assert_eq!(batch.len(), 1);
        batch.clear();
        assert_eq!(handoff.take(&mut batch), None);
    }

    #[test]
    fn test_finish_with_empty_slot() {
        let handoff = Handoff::new(2, 4);
        assert!(!handoff.finish(1));
        assert_eq!(handoff.take(&mut Vec::new()), None);
    }

    #[test]
    fn test_producer_waits_for_ready_slot() {
        let handoff = Arc::new(Handoff::new(2, 4));
        let (tx, rx) = mpsc::channel();

        let producer = {
            let handoff = Arc::clone(&handoff);
            std::thread::spawn(move || {
                handoff.append(0, frame(1));
                assert_eq!(handoff.publish(0), Some(1));
                handoff.append(1, frame(2));
                // Slot 0 is still ready, so this blocks until it is taken
                let next = handoff.publish(1);
                tx.send(next).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        let mut batch = Vec::new();
        assert_eq!(handoff.take(&mut batch), Some(0));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(0));
        producer.join().unwrap();

        batch.clear();
        assert_eq!(handoff.take(&mut batch), Some(1));
        assert_eq!(batch[0].timestamp_us(), 2);
    }

    #[test]
    fn test_consumer_exit_releases_producer() {
        let handoff = Arc::new(Handoff::new(2, 4));
        handoff.append(0, frame(1));
        handoff.publish(0);

        let producer = {
            let handoff = Arc::clone(&handoff);
            std::thread::spawn(move || handoff.publish(1))
        };

        std::thread::sleep(Duration::from_millis(20));
        handoff.consumer_exited();
        assert_eq!(producer.join().unwrap(), None);
    }

    #[test]
    fn test_reset_clears_slots() {
        let handoff = Handoff::new(3, 4);
        handoff.append(0, frame(1));
        handoff.publish(0);
        handoff.append(1, frame(2));
        handoff.finish(1);
        handoff.request_stop();

        handoff.reset();
        assert_eq!(handoff.pending(), 0);
        assert_eq!(handoff.slot_count(), 3);
        assert!(handoff.slots.iter().all(|s| lock(s).is_empty()));
    }

    #[test]
    fn test_reset_keeps_pending_stop() {
        let handoff = Handoff::new(2, 4);
        handoff.request_stop();

        handoff.reset();
        assert!(handoff.stop_requested());

        handoff.clear_stop();
        assert!(!handoff.stop_requested());
    }
}

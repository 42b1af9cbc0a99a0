//! Simulated CAN Source
//!
//! Generates random frames at a configurable rate, for running the monitor
//! without bus hardware.

use crate::error::SourceError;
use crate::FrameSource;
use can_frame::{id, CanFrame, MAX_DLC};
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default generation rate (frames per second)
pub const DEFAULT_FRAME_RATE: u32 = 10;

/// Default identifier range (inclusive)
pub const DEFAULT_ID_RANGE: (u32, u32) = (0x100, 0x7FF);

/// Random frame generator with optional real-time pacing
pub struct MockCanSource {
    /// Random number generator
    rng: StdRng,
    /// Identifier distribution over the configured range
    id_dist: Uniform<u32>,
    /// Configured identifier range (inclusive)
    id_range: (u32, u32),
    /// Interval between frames in microseconds
    frame_interval_us: u64,
    /// Frames generated so far (drives the synthetic timestamp)
    frame_counter: u64,
    /// When the previous frame was handed out
    last_frame: Option<Instant>,
    /// Whether to sleep between frames
    paced: bool,
}

impl MockCanSource {
    /// Create a source seeded from OS entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a reproducible source
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let (min, max) = DEFAULT_ID_RANGE;
        Self {
            rng,
            id_dist: Uniform::new_inclusive(min, max),
            id_range: DEFAULT_ID_RANGE,
            frame_interval_us: interval_for_rate(DEFAULT_FRAME_RATE),
            frame_counter: 0,
            last_frame: None,
            paced: true,
        }
    }

    /// Set the generation rate; 0 falls back to the default rate
    pub fn set_rate(&mut self, frames_per_sec: u32) {
        self.frame_interval_us = interval_for_rate(frames_per_sec);
        info!(
            "Mock source rate set to {} fps ({} µs interval)",
            frames_per_sec, self.frame_interval_us
        );
    }

    /// Restrict generated identifiers to `min..=max`
    pub fn set_id_range(&mut self, min: u32, max: u32) -> Result<(), SourceError> {
        if min > max || !id::is_valid(max) {
            return Err(SourceError::InvalidIdRange { min, max });
        }
        self.id_dist = Uniform::new_inclusive(min, max);
        self.id_range = (min, max);
        info!("Mock source id range set to {:03X}-{:03X}", min, max);
        Ok(())
    }

    /// Enable or disable real-time pacing
    pub fn set_pacing(&mut self, paced: bool) {
        self.paced = paced;
    }

    /// Builder-style variant of [`set_pacing`](Self::set_pacing)
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    /// Interval between frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(self.frame_interval_us)
    }

    /// Configured identifier range (inclusive)
    pub fn id_range(&self) -> (u32, u32) {
        self.id_range
    }

    /// Number of frames generated so far
    pub fn frames_generated(&self) -> u64 {
        self.frame_counter
    }

    fn wait_for_slot(&self) {
        if let Some(last) = self.last_frame {
            let interval = self.frame_interval();
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
    }

    fn generate(&mut self) -> Result<CanFrame, SourceError> {
        let id = self.rng.sample(&self.id_dist);
        let dlc = self.rng.gen_range(1..=MAX_DLC);

        let mut data = [0u8; 8];
        self.rng.fill(&mut data[..dlc as usize]);

        self.frame_counter += 1;
        let timestamp_us = self.frame_counter * self.frame_interval_us;

        Ok(CanFrame::from_parts(id, dlc, data, timestamp_us)?)
    }
}

impl Default for MockCanSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockCanSource {
    fn next_frame(&mut self) -> Result<CanFrame, SourceError> {
        if self.paced {
            self.wait_for_slot();
        }

        let frame = self.generate()?;
        self.last_frame = Some(Instant::now());
        debug!("Generated frame {}", frame);
        Ok(frame)
    }
}

fn interval_for_rate(frames_per_sec: u32) -> u64 {
    let rate = if frames_per_sec == 0 {
        DEFAULT_FRAME_RATE
    } else {
        frames_per_sec
    };
    1_000_000 / rate as u64
}

//! Replay Source

use crate::error::SourceError;
use crate::FrameSource;
use can_frame::CanFrame;
use tracing::debug;

/// Yields a recorded sequence of frames in order
#[derive(Debug, Clone)]
pub struct ReplaySource {
    frames: Vec<CanFrame>,
    position: usize,
    looping: bool,
}

impl ReplaySource {
    /// Replay `frames` once, then report [`SourceError::Exhausted`]
    pub fn new(frames: Vec<CanFrame>) -> Self {
        Self {
            frames,
            position: 0,
            looping: false,
        }
    }

    /// Replay `frames` endlessly
    pub fn looping(frames: Vec<CanFrame>) -> Self {
        Self {
            looping: true,
            ..Self::new(frames)
        }
    }

    /// Frames left before exhaustion (always the full length when looping)
    pub fn remaining(&self) -> usize {
        if self.looping {
            self.frames.len()
        } else {
            self.frames.len() - self.position
        }
    }
}

impl From<Vec<CanFrame>> for ReplaySource {
    fn from(frames: Vec<CanFrame>) -> Self {
        Self::new(frames)
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<CanFrame, SourceError> {
        if self.position >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Err(SourceError::Exhausted);
            }
            debug!("Replay wrapped after {} frames", self.frames.len());
            self.position = 0;
        }

        let frame = self.frames[self.position];
        self.position += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: u64) -> Vec<CanFrame> {
        (0..n).map(|i| CanFrame::new(0x100, &[i as u8], i).unwrap()).collect()
    }

    #[test]
    fn test_replay_once() {
        let mut source = ReplaySource::new(frames(2));
        assert_eq!(source.next_frame().unwrap().timestamp_us(), 0);
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.next_frame().unwrap().timestamp_us(), 1);
        assert!(matches!(source.next_frame(), Err(SourceError::Exhausted)));
    }

    #[test]
    fn test_replay_loops() {
        let mut source = ReplaySource::looping(frames(2));
        let stamps: Vec<u64> = (0..5)
            .map(|_| source.next_frame().unwrap().timestamp_us())
            .collect();
        assert_eq!(stamps, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_empty_loop_is_exhausted() {
        let mut source = ReplaySource::looping(Vec::new());
        assert!(matches!(source.next_frame(), Err(SourceError::Exhausted)));
    }
}

//! Pipeline configuration

use crate::PipelineError;
use serde::{Deserialize, Serialize};

/// Default frames per batch before a slot is handed off
pub const DEFAULT_BATCH_THRESHOLD: usize = 32;

/// Default number of slots (double buffering)
pub const DEFAULT_SLOT_COUNT: usize = 2;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames collected in a slot before it is handed to the consumer
    pub batch_threshold: usize,

    /// Number of slots in the ring; 2 is classic double buffering
    pub slot_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            slot_count: DEFAULT_SLOT_COUNT,
        }
    }
}

impl PipelineConfig {
    /// Hand off every frame as soon as it arrives
    pub fn low_latency() -> Self {
        Self {
            batch_threshold: 1,
            ..Default::default()
        }
    }

    /// Large batches over three slots, for bursty sources
    pub fn high_throughput() -> Self {
        Self {
            batch_threshold: 256,
            slot_count: 3,
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_threshold == 0 {
            return Err(PipelineError::InvalidConfig(
                "batch_threshold must be at least 1".to_string(),
            ));
        }
        if self.slot_count < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "slot_count must be at least 2, got {}",
                self.slot_count
            )));
        }
        Ok(())
    }
}

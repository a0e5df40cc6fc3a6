//! Configuration for a complete producer/consumer session

use crate::consumer::ConsumerConfig;
use ns_core::{NsError, NsResult};
use ns_simulation::ProducerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Top-level session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
    /// Directory export files are written to
    pub export_dir: PathBuf,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            producer: ProducerConfig::default(),
            consumer: ConsumerConfig::default(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> NsResult<()> {
        self.producer.validate()?;
        self.consumer.validate()?;

        // The history only needs to cover roughly the ring's time span
        let ring_secs = self.consumer.ring_capacity as f32 / self.producer.sample_rate;
        let history_secs = self.consumer.history_frames as f32 * self.producer.tick_interval_ms / 1000.0;
        if history_secs < ring_secs * 0.5 || history_secs > ring_secs * 2.0 {
            warn!(
                ring_secs,
                history_secs,
                "frame history and ring buffer cover very different time windows"
            );
        }
        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> NsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NsError::InvalidConfig {
            reason: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> NsResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| NsError::InvalidConfig {
            reason: format!("Failed to deserialize configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> NsResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| NsError::InvalidConfig {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> NsResult<()> {
        std::fs::write(path, self.to_json()?).map_err(|e| NsError::InvalidConfig {
            reason: format!("Failed to write {}: {}", path.display(), e),
        })
    }
}

//! Instantaneous per-channel signal quality model
//!
//! Not an impedance model: the constants are tuned for plausible-looking
//! indicators and can be adjusted freely.

use ns_core::{Channel, CHANNEL_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How strongly regime noise degrades quality
pub const NOISE_SENSITIVITY: f32 = 1.5;

/// Lowest reported quality
pub const QUALITY_FLOOR: f32 = 0.45;

/// Highest reported quality
pub const QUALITY_CEILING: f32 = 0.97;

/// Half-width of the uniform jitter added per estimate
pub const JITTER_AMPLITUDE: f32 = 0.02;

/// `baseline * (1 - noise * k) + jitter`, clamped to the realistic band
pub fn estimate_quality(channel: Channel, noise_weight: f32, jitter: f32) -> f32 {
    let degraded = channel.baseline_quality() * (1.0 - noise_weight * NOISE_SENSITIVITY);
    (degraded + jitter).clamp(QUALITY_FLOOR, QUALITY_CEILING)
}

/// Quality estimator with its own jitter source
pub struct QualityEstimator {
    rng: StdRng,
    jitter_amplitude: f32,
}

impl QualityEstimator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            jitter_amplitude: JITTER_AMPLITUDE,
        }
    }

    /// Disable jitter so estimates depend only on channel and noise weight
    pub fn without_jitter(mut self) -> Self {
        self.jitter_amplitude = 0.0;
        self
    }

    pub fn estimate(&mut self, channel: Channel, noise_weight: f32) -> f32 {
        let jitter = if self.jitter_amplitude > 0.0 {
            self.rng.gen_range(-self.jitter_amplitude..=self.jitter_amplitude)
        } else {
            0.0
        };
        estimate_quality(channel, noise_weight, jitter)
    }

    /// One estimate per channel, indexed by `Channel::index`
    pub fn snapshot(&mut self, noise_weight: f32) -> [f32; CHANNEL_COUNT] {
        let mut quality = [0.0; CHANNEL_COUNT];
        for channel in Channel::ALL {
            quality[channel.index()] = self.estimate(channel, noise_weight);
        }
        quality
    }
}

//! Sum-of-sines EEG synthesizer with Gaussian noise

use ns_core::{Band, Channel, NsError, NsResult, StateWeights, CHANNEL_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Open01};
use std::f64::consts::TAU;

/// Band weights below this contribute less than one f32 ulp and are skipped
pub const NEGLIGIBLE_WEIGHT: f32 = f32::EPSILON;

/// Supported nominal sample rates (Hz)
pub const MIN_SAMPLE_RATE: f32 = 16.0;
pub const MAX_SAMPLE_RATE: f32 = 4096.0;

/// Validate a nominal sample rate
pub fn validate_sampling_rate(rate: f32) -> NsResult<()> {
    if !rate.is_finite() || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
        Err(NsError::InvalidSamplingRate {
            rate,
            valid_range: format!("{}-{}Hz", MIN_SAMPLE_RATE, MAX_SAMPLE_RATE),
        })
    } else {
        Ok(())
    }
}

/// Compute one sample for `channel` at sample index `n`.
///
/// `noise` is a standard-normal draw supplied by the caller; it is scaled by
/// the regime's noise weight here. With `noise == 0.0` the result is a pure
/// function of its arguments.
pub fn synthesize_sample(
    channel: Channel,
    n: u64,
    sample_rate: f32,
    weights: &StateWeights,
    noise: f32,
) -> f32 {
    // f64 time keeps the phase accurate for long sessions
    let t = n as f64 / f64::from(sample_rate);
    let phases = channel.phase_offsets();

    let mut signal = 0.0_f64;
    for band in Band::ALL {
        let weight = weights.band(band);
        if weight < NEGLIGIBLE_WEIGHT {
            continue;
        }
        let phase = f64::from(phases[band.index()]);
        signal += f64::from(weight) * (TAU * f64::from(band.frequency_hz()) * t + phase).sin();
    }

    signal += f64::from(noise) * f64::from(weights.noise);

    let scaled = (signal * f64::from(channel.amplitude_scale())) as f32;
    if scaled.is_nan() {
        return 0.0;
    }
    scaled.clamp(-1.0, 1.0)
}

/// Standard-normal draw via the Box-Muller transform.
///
/// Both uniforms come from the open interval (0, 1) so `ln` never sees zero.
pub fn gaussian_noise<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u: f64 = Open01.sample(rng);
    let v: f64 = Open01.sample(rng);
    ((-2.0 * u.ln()).sqrt() * (TAU * v).cos()) as f32
}

/// Stateful wrapper owning the noise source
pub struct Synthesizer {
    sample_rate: f32,
    rng: StdRng,
    noise_enabled: bool,
}

impl Synthesizer {
    /// Create a synthesizer. A fixed `seed` makes the noise sequence reproducible.
    pub fn new(sample_rate: f32, seed: Option<u64>) -> NsResult<Self> {
        validate_sampling_rate(sample_rate)?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Synthesizer {
            sample_rate,
            rng,
            noise_enabled: true,
        })
    }

    /// Enable or disable the Gaussian noise term
    pub fn with_noise(mut self, enabled: bool) -> Self {
        self.noise_enabled = enabled;
        self
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn noise_enabled(&self) -> bool {
        self.noise_enabled
    }

    /// Generate a single sample
    pub fn sample(&mut self, channel: Channel, n: u64, weights: &StateWeights) -> f32 {
        let noise = if self.noise_enabled && weights.noise > 0.0 {
            gaussian_noise(&mut self.rng)
        } else {
            0.0
        };
        synthesize_sample(channel, n, self.sample_rate, weights, noise)
    }

    /// Generate `count` consecutive samples per channel starting at `start_index`
    pub fn generate_block(
        &mut self,
        start_index: u64,
        count: usize,
        weights: &StateWeights,
    ) -> [Vec<f32>; CHANNEL_COUNT] {
        let mut block: [Vec<f32>; CHANNEL_COUNT] =
            std::array::from_fn(|_| Vec::with_capacity(count));

        for channel in Channel::ALL {
            let samples = &mut block[channel.index()];
            for offset in 0..count as u64 {
                let value = self.sample(channel, start_index + offset, weights);
                samples.push(value);
            }
        }

        block
    }
}

//! Frame: one batch of newly generated samples across all channels

use crate::eeg_types::{Band, BrainState, Channel, StateWeights, BAND_COUNT, CHANNEL_COUNT};
use crate::error::{NsError, NsResult};
use serde::{Deserialize, Serialize};

/// Relative band "power" in percent, summing to 100.
///
/// This is a closed-form proxy derived from the regime weights (`weight²`,
/// normalized). It is not a spectral estimate and must not be replaced by one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPower {
    percent: [f32; BAND_COUNT],
}

impl BandPower {
    /// Even split across all bands
    pub fn uniform() -> Self {
        Self {
            percent: [100.0 / BAND_COUNT as f32; BAND_COUNT],
        }
    }

    /// Square each band weight and normalize the five values to 100.
    ///
    /// An all-zero weight vector has no meaningful proportion and yields the
    /// uniform split instead of dividing by zero.
    pub fn from_weights(weights: &StateWeights) -> Self {
        let squares: [f64; BAND_COUNT] = Band::ALL.map(|band| {
            let w = f64::from(weights.band(band));
            w * w
        });
        let total: f64 = squares.iter().sum();

        if total <= f64::EPSILON {
            return Self::uniform();
        }

        Self {
            percent: squares.map(|sq| (sq / total * 100.0) as f32),
        }
    }

    #[inline]
    pub fn get(&self, band: Band) -> f32 {
        self.percent[band.index()]
    }

    pub fn total(&self) -> f32 {
        self.percent.iter().sum()
    }

    /// Band with the largest share; ties resolve to the lower band
    pub fn dominant(&self) -> Band {
        Band::ALL
            .into_iter()
            .fold(Band::Delta, |best, band| {
                if self.get(band) > self.get(best) {
                    band
                } else {
                    best
                }
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, f32)> + '_ {
        Band::ALL.into_iter().map(move |band| (band, self.get(band)))
    }
}

impl Default for BandPower {
    fn default() -> Self {
        Self::uniform()
    }
}

/// One emitted batch of samples.
///
/// Every channel carries the same number of samples. A frame is immutable
/// once built: later regime changes never touch a frame already in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Per-session emission counter, starting at 0
    pub sequence: u64,
    /// Wall-clock time of emission, milliseconds since Unix epoch
    pub timestamp_ms: u64,
    /// Nominal sample rate the samples were generated at
    pub sample_rate: f32,
    /// Sample index of the first sample in this frame
    pub start_index: u64,
    /// Regime the samples were synthesized under
    pub state: BrainState,
    /// New samples per channel, indexed by `Channel::index`
    pub channels: [Vec<f32>; CHANNEL_COUNT],
    /// Band-power summary for the regime active at synthesis time
    pub band_power: BandPower,
    /// Instantaneous quality estimate per channel
    pub channel_quality: [f32; CHANNEL_COUNT],
}

impl Frame {
    /// Build a frame, validating that all channels agree on sample count
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        timestamp_ms: u64,
        sample_rate: f32,
        start_index: u64,
        state: BrainState,
        channels: [Vec<f32>; CHANNEL_COUNT],
        band_power: BandPower,
        channel_quality: [f32; CHANNEL_COUNT],
    ) -> NsResult<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(NsError::InvalidSamplingRate {
                rate: sample_rate,
                valid_range: "> 0Hz".to_string(),
            });
        }

        let expected = channels[0].len();
        if expected == 0 {
            return Err(NsError::MalformedFrame {
                reason: "frame carries no samples".to_string(),
            });
        }
        if let Some(channel) = Channel::ALL
            .into_iter()
            .find(|ch| channels[ch.index()].len() != expected)
        {
            return Err(NsError::MalformedFrame {
                reason: format!(
                    "channel {} has {} samples, expected {}",
                    channel,
                    channels[channel.index()].len(),
                    expected
                ),
            });
        }
        if let Some(q) = channel_quality.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(NsError::MalformedFrame {
                reason: format!("channel quality {} outside [0, 1]", q),
            });
        }

        Ok(Frame {
            sequence,
            timestamp_ms,
            sample_rate,
            start_index,
            state,
            channels,
            band_power,
            channel_quality,
        })
    }

    /// Samples per channel
    pub fn sample_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, channel: Channel) -> &[f32] {
        &self.channels[channel.index()]
    }

    pub fn quality(&self, channel: Channel) -> f32 {
        self.channel_quality[channel.index()]
    }

    /// Interpolated wall-clock time of the sample at `offset` within the frame.
    ///
    /// Frames carry one timestamp; individual samples are spaced at the
    /// nominal sample period from it.
    pub fn sample_timestamp_ms(&self, offset: usize) -> f64 {
        self.timestamp_ms as f64 + offset as f64 * (1000.0 / f64::from(self.sample_rate))
    }

    /// Time span covered by the samples, in seconds
    pub fn duration_secs(&self) -> f64 {
        self.sample_count() as f64 / f64::from(self.sample_rate)
    }
}

/// Current wall-clock time in milliseconds since Unix epoch
pub fn wall_clock_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Summary statistics over a window of samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f32,
    pub rms: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
    pub peak_to_peak: f32,
}

impl ChannelStats {
    /// Single pass with f64 accumulators. An empty window gives all zeros.
    pub fn calculate(data: &[f32]) -> Self {
        if data.is_empty() {
            return Self::default();
        }

        let (mut sum, mut sum_sq) = (0.0_f64, 0.0_f64);
        let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
        for &x in data {
            sum += f64::from(x);
            sum_sq += f64::from(x) * f64::from(x);
            min = min.min(x);
            max = max.max(x);
        }

        let n = data.len() as f64;
        let mean = sum / n;
        let mean_sq = sum_sq / n;
        Self {
            mean: mean as f32,
            rms: mean_sq.sqrt() as f32,
            std_dev: (mean_sq - mean * mean).max(0.0).sqrt() as f32,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels_of(len: usize) -> [Vec<f32>; CHANNEL_COUNT] {
        std::array::from_fn(|ch| (0..len).map(|i| (ch * 100 + i) as f32 * 0.001).collect())
    }

    #[test]
    fn test_band_power_sums_to_100() {
        for state in BrainState::ALL {
            let power = BandPower::from_weights(&state.weights());
            assert!((power.total() - 100.0).abs() < 1e-3, "{}: {}", state, power.total());
        }

        let lopsided = StateWeights::new([0.0, 0.0, 0.0, 0.0, 3.5], 0.0);
        let power = BandPower::from_weights(&lopsided);
        assert!((power.get(Band::Gamma) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_band_power_squares_weights() {
        // Relaxed: alpha 1.0 vs theta 0.3 -> ratio of squares is 1 / 0.09
        let power = BandPower::from_weights(&BrainState::Relaxed.weights());
        let ratio = power.get(Band::Alpha) / power.get(Band::Theta);
        assert!((ratio - 1.0 / 0.09).abs() < 1e-2);
        assert_eq!(power.dominant(), Band::Alpha);

        let rem = BandPower::from_weights(&BrainState::Rem.weights());
        assert_eq!(rem.dominant(), Band::Delta);
    }

    #[test]
    fn test_band_power_all_zero_weights() {
        let power = BandPower::from_weights(&StateWeights::new([0.0; BAND_COUNT], 0.5));
        assert_eq!(power, BandPower::uniform());
        assert!(power.iter().all(|(_, p)| p.is_finite()));
    }

    #[test]
    fn test_frame_creation() {
        let frame = Frame::new(
            0,
            1_700_000_000_000,
            256.0,
            0,
            BrainState::Relaxed,
            channels_of(4),
            BandPower::uniform(),
            [0.9; CHANNEL_COUNT],
        )
        .unwrap();

        assert_eq!(frame.sample_count(), 4);
        assert_eq!(frame.channel(Channel::Fz)[1], frame.channels[2][1]);
        assert!((frame.duration_secs() - 4.0 / 256.0).abs() < 1e-12);
        assert!((frame.sample_timestamp_ms(2) - (1_700_000_000_000.0 + 2.0 * 3.90625)).abs() < 1e-3);
    }

    #[test]
    fn test_frame_rejects_ragged_channels() {
        let mut channels = channels_of(4);
        channels[Channel::O2.index()].pop();

        let err = Frame::new(
            0,
            0,
            256.0,
            0,
            BrainState::Alert,
            channels,
            BandPower::uniform(),
            [0.9; CHANNEL_COUNT],
        )
        .unwrap_err();

        assert!(matches!(err, NsError::MalformedFrame { .. }));
        assert!(err.to_string().contains("O2"));
    }

    #[test]
    fn test_frame_rejects_empty_and_bad_quality() {
        let empty = Frame::new(
            0, 0, 256.0, 0, BrainState::Alert,
            channels_of(0), BandPower::uniform(), [0.9; CHANNEL_COUNT],
        );
        assert!(empty.is_err());

        let mut quality = [0.9; CHANNEL_COUNT];
        quality[3] = 1.2;
        let bad_quality = Frame::new(
            0, 0, 256.0, 0, BrainState::Alert,
            channels_of(2), BandPower::uniform(), quality,
        );
        assert!(bad_quality.is_err());
    }

    #[test]
    fn test_channel_stats() {
        let stats = ChannelStats::calculate(&[-1.0, 1.0, -1.0, 1.0]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.rms, 1.0);
        assert_eq!(stats.peak_to_peak, 2.0);

        assert_eq!(stats.std_dev, 1.0);

        let offset = ChannelStats::calculate(&[0.5, 0.5, 0.5]);
        assert_eq!(offset.std_dev, 0.0);
        assert_eq!(offset.rms, 0.5);

        assert_eq!(ChannelStats::calculate(&[]), ChannelStats::default());
    }
}

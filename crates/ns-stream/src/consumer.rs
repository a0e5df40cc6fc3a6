//! Ring buffer consumer: folds producer events into render-ready state
//!
//! Every event is handled in work proportional to the samples it carries,
//! never to the buffer capacity, so the consumer never stalls a refresh.

use crate::history::FrameHistory;
use crate::ring_buffer::RingBuffer;
use crate::throughput::ThroughputMeter;
use ns_core::{
    config_error, BandPower, BrainState, Channel, ChannelStats, Frame, NsResult, QualityLabel,
    CHANNEL_COUNT,
};
use ns_simulation::ProducerEvent;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for the consumer side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Samples retained per channel (5s at 256Hz)
    pub ring_capacity: usize,
    /// Frames retained for export
    pub history_frames: usize,
    /// Window over which the measured sample rate is averaged
    pub throughput_window_ms: u64,
    /// Weight of the live estimate in the quality blend; the per-channel
    /// baseline gets the rest
    pub quality_live_weight: f32,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 1280,
            history_frames: 330,
            throughput_window_ms: 2000,
            quality_live_weight: 0.2,
        }
    }
}

impl ConsumerConfig {
    pub fn validate(&self) -> NsResult<()> {
        if self.ring_capacity == 0 {
            return Err(config_error!("ring capacity must be non-zero"));
        }
        if self.history_frames == 0 {
            return Err(config_error!("history must retain at least one frame"));
        }
        if self.throughput_window_ms == 0 {
            return Err(config_error!("throughput window must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.quality_live_weight) {
            return Err(config_error!(
                "quality live weight must be within [0, 1], got {}",
                self.quality_live_weight
            ));
        }
        Ok(())
    }

    pub fn throughput_window(&self) -> Duration {
        Duration::from_millis(self.throughput_window_ms)
    }
}

/// Owned copy of everything a renderer or exporter reads
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSnapshot {
    pub state: BrainState,
    pub write_cursor: u64,
    pub windows: [Vec<f32>; CHANNEL_COUNT],
    pub quality: [f32; CHANNEL_COUNT],
    pub band_power: BandPower,
    pub measured_rate: Option<f64>,
}

impl SignalSnapshot {
    pub fn quality_label(&self, channel: Channel) -> QualityLabel {
        QualityLabel::from_score(self.quality[channel.index()])
    }
}

pub struct RingBufferConsumer {
    config: ConsumerConfig,
    ring: RingBuffer,
    history: FrameHistory,
    throughput: ThroughputMeter,
    quality: [f32; CHANNEL_COUNT],
    band_power: BandPower,
    state: BrainState,
    expected_sequence: Option<u64>,
    frames_received: u64,
    flushes: u64,
}

impl RingBufferConsumer {
    pub fn new(config: ConsumerConfig) -> NsResult<Self> {
        config.validate()?;

        let ring = RingBuffer::new(config.ring_capacity)?;
        let history = FrameHistory::new(config.history_frames)?;
        let throughput = ThroughputMeter::new(config.throughput_window());

        Ok(Self {
            config,
            ring,
            history,
            throughput,
            quality: Channel::ALL.map(Channel::baseline_quality),
            band_power: BandPower::default(),
            state: BrainState::default(),
            expected_sequence: None,
            frames_received: 0,
            flushes: 0,
        })
    }

    /// Handle one inbound producer event, received at `now`
    pub fn handle_event(&mut self, event: ProducerEvent, now: Instant) {
        match event {
            ProducerEvent::Frame(frame) => self.apply_frame(frame, now),
            ProducerEvent::Flush { state } => self.flush(state),
        }
    }

    pub fn apply_frame(&mut self, frame: Frame, now: Instant) {
        // sequence restarts at 0 after the producer is stopped
        if let Some(expected) = self.expected_sequence {
            if frame.sequence != expected && frame.sequence != 0 {
                warn!(expected, received = frame.sequence, "frame sequence gap");
            }
        }
        self.expected_sequence = Some(frame.sequence + 1);

        self.ring.write_frame(&frame);

        let live_weight = self.config.quality_live_weight;
        for channel in Channel::ALL {
            self.quality[channel.index()] = channel.baseline_quality() * (1.0 - live_weight)
                + frame.quality(channel) * live_weight;
        }

        if let Some(rate) = self.throughput.record(frame.sample_count(), now) {
            debug!(measured_rate = rate, nominal = frame.sample_rate, "throughput window closed");
        }

        self.band_power = frame.band_power;
        self.state = frame.state;
        self.frames_received += 1;
        self.history.push(frame);
    }

    /// Drop everything buffered so the new regime shows immediately
    pub fn flush(&mut self, state: BrainState) {
        self.ring.clear();
        self.history.clear();
        self.expected_sequence = None;
        self.state = state;
        self.band_power = BandPower::from_weights(&state.weights());
        self.flushes += 1;
        info!(state = %state, "buffers flushed");
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Circular sample array for one channel, in slot order
    pub fn buffer(&self, channel: Channel) -> &[f32] {
        self.ring.raw(channel)
    }

    /// Retained samples for one channel, oldest first
    pub fn window(&self, channel: Channel) -> Vec<f32> {
        self.ring.window(channel)
    }

    pub fn write_cursor(&self) -> u64 {
        self.ring.cursor()
    }

    pub fn quality(&self, channel: Channel) -> f32 {
        self.quality[channel.index()]
    }

    pub fn quality_map(&self) -> &[f32; CHANNEL_COUNT] {
        &self.quality
    }

    pub fn quality_label(&self, channel: Channel) -> QualityLabel {
        QualityLabel::from_score(self.quality(channel))
    }

    pub fn band_power(&self) -> &BandPower {
        &self.band_power
    }

    pub fn measured_rate(&self) -> Option<f64> {
        self.throughput.measured_rate()
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    pub fn state(&self) -> BrainState {
        self.state
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Statistics over the retained window of one channel
    pub fn channel_stats(&self, channel: Channel) -> ChannelStats {
        ChannelStats::calculate(&self.window(channel))
    }

    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            state: self.state,
            write_cursor: self.write_cursor(),
            windows: Channel::ALL.map(|channel| self.window(channel)),
            quality: self.quality,
            band_power: self.band_power,
            measured_rate: self.measured_rate(),
        }
    }
}

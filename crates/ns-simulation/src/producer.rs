//! Producer process: paced synthesis behind a message-passing interface
//!
//! `SignalProducer` is the synchronous core (commands in, frames out) and is
//! what the tests drive directly. `RealTimeProducer` runs it on a tokio
//! interval and talks to the outside world only through channels.

use crate::pacer::{Pacer, PacerStep};
use crate::quality::QualityEstimator;
use crate::synthesizer::{validate_sampling_rate, Synthesizer};
use ns_core::{config_error, wall_clock_millis, BandPower, BrainState, Frame, NsError, NsResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const CONTROL_CHANNEL: &str = "producer control";
const CONTROL_CAPACITY: usize = 32;

/// Accepted timer periods (ms)
pub const MIN_TICK_INTERVAL_MS: f32 = 1.0;
pub const MAX_TICK_INTERVAL_MS: f32 = 1000.0;

/// Accepted resume gap factors
pub const MIN_RESUME_GAP_FACTOR: f32 = 2.0;
pub const MAX_RESUME_GAP_FACTOR: f32 = 1000.0;

/// Configuration for the producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Nominal sample rate in Hz
    pub sample_rate: f32,
    /// Timer callback period in milliseconds
    pub tick_interval_ms: f32,
    /// Gaps longer than this many tick intervals resume fresh instead of backfilling
    pub resume_gap_factor: f32,
    /// Regime active when the producer is created
    pub initial_state: BrainState,
    /// Random seed for reproducible noise and quality jitter
    pub seed: Option<u64>,
    /// Add Gaussian noise to synthesized samples
    pub noise_enabled: bool,
    /// Capacity of the frame/flush event channel
    pub event_capacity: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 256.0,
            tick_interval_ms: 15.625, // 4 samples per tick at 256Hz
            resume_gap_factor: 8.0,
            initial_state: BrainState::Relaxed,
            seed: None,
            noise_enabled: true,
            event_capacity: 256,
        }
    }
}

impl ProducerConfig {
    pub fn validate(&self) -> NsResult<()> {
        validate_sampling_rate(self.sample_rate)?;

        if !(MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS).contains(&self.tick_interval_ms) {
            return Err(config_error!(
                "tick interval must be within {}-{}ms, got {}ms",
                MIN_TICK_INTERVAL_MS,
                MAX_TICK_INTERVAL_MS,
                self.tick_interval_ms
            ));
        }
        if !(MIN_RESUME_GAP_FACTOR..=MAX_RESUME_GAP_FACTOR).contains(&self.resume_gap_factor) {
            return Err(config_error!(
                "resume gap factor must be within {}-{}, got {}",
                MIN_RESUME_GAP_FACTOR,
                MAX_RESUME_GAP_FACTOR,
                self.resume_gap_factor
            ));
        }
        if self.event_capacity == 0 {
            return Err(config_error!("event channel capacity must be non-zero"));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.tick_interval_ms) / 1000.0)
    }
}

/// Commands accepted by the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerCommand {
    /// Begin or resume emission. Idempotent.
    Start,
    /// Halt emission, reset pacing and rewind the sample index. Idempotent.
    Stop,
    /// Halt emission and reset pacing, keeping the sample index
    Pause,
    /// Switch regime for subsequent synthesis; always answered with a flush
    SetState(BrainState),
}

/// Messages sent from the producer to the consumer
#[derive(Debug, Clone, PartialEq)]
pub enum ProducerEvent {
    Frame(Frame),
    /// Discard all buffered history; sent once per `SetState`
    Flush { state: BrainState },
}

/// Producer-side counters, published after every tick and command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerStats {
    pub is_running: bool,
    pub state: BrainState,
    pub frames_emitted: u64,
    pub samples_emitted: u64,
    pub sample_index: u64,
    pub sample_debt: f64,
    pub resyncs: u64,
    pub flushes: u64,
}

/// Synchronous producer core
pub struct SignalProducer {
    config: ProducerConfig,
    synthesizer: Synthesizer,
    quality: QualityEstimator,
    pacer: Pacer,
    state: BrainState,
    running: bool,
    next_sequence: u64,
    stats: ProducerStats,
}

impl SignalProducer {
    pub fn new(config: ProducerConfig) -> NsResult<Self> {
        config.validate()?;

        let synthesizer = Synthesizer::new(config.sample_rate, config.seed)?
            .with_noise(config.noise_enabled);
        let quality = QualityEstimator::new(config.seed.map(|s| s.wrapping_add(1)));
        let pacer = Pacer::new(
            config.sample_rate,
            config.tick_interval(),
            config.resume_gap_factor,
        );
        let state = config.initial_state;

        Ok(SignalProducer {
            config,
            synthesizer,
            quality,
            pacer,
            state,
            running: false,
            next_sequence: 0,
            stats: ProducerStats {
                state,
                ..Default::default()
            },
        })
    }

    /// Apply a command; returns the event it produces, if any
    pub fn handle_command(&mut self, command: ProducerCommand) -> Option<ProducerEvent> {
        match command {
            ProducerCommand::Start => {
                self.start();
                None
            }
            ProducerCommand::Stop => {
                self.stop();
                None
            }
            ProducerCommand::Pause => {
                self.pause();
                None
            }
            ProducerCommand::SetState(state) => Some(self.set_state(state)),
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.pacer.reset();
        self.stats.is_running = true;
        info!(state = %self.state, "producer started");
    }

    pub fn stop(&mut self) {
        let was_running = self.running;
        self.running = false;
        self.pacer.rewind();
        self.next_sequence = 0;
        self.stats.is_running = false;
        self.stats.sample_index = 0;
        self.stats.sample_debt = 0.0;
        if was_running {
            info!(frames = self.stats.frames_emitted, "producer stopped");
        }
    }

    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.pacer.reset();
        self.stats.is_running = false;
        self.stats.sample_debt = 0.0;
        info!(sample_index = self.pacer.sample_index(), "producer paused");
    }

    /// Switch regime. Every call yields exactly one flush, even when the
    /// requested regime is already active.
    pub fn set_state(&mut self, state: BrainState) -> ProducerEvent {
        if state != self.state {
            info!(from = %self.state, to = %state, "regime changed");
        } else {
            debug!(state = %state, "regime re-selected");
        }
        self.state = state;
        self.stats.state = state;
        self.stats.flushes += 1;
        ProducerEvent::Flush { state }
    }

    /// Run one pacing tick at `now`. Returns a frame when whole samples are due.
    pub fn on_tick(&mut self, now: std::time::Instant) -> NsResult<Option<Frame>> {
        if !self.running {
            return Ok(None);
        }

        let frame = match self.pacer.advance(now) {
            PacerStep::Baseline | PacerStep::Idle => None,
            PacerStep::Resync { gap } => {
                self.stats.resyncs += 1;
                warn!(
                    gap_ms = gap.as_millis() as u64,
                    "timer gap exceeded resume threshold, resuming without backfill"
                );
                None
            }
            PacerStep::Emit { start_index, count } => Some(self.build_frame(start_index, count)?),
        };

        self.stats.sample_index = self.pacer.sample_index();
        self.stats.sample_debt = self.pacer.sample_debt();
        Ok(frame)
    }

    fn build_frame(&mut self, start_index: u64, count: usize) -> NsResult<Frame> {
        let weights = self.state.weights();
        let channels = self.synthesizer.generate_block(start_index, count, &weights);
        let channel_quality = self.quality.snapshot(weights.noise);

        let frame = Frame::new(
            self.next_sequence,
            wall_clock_millis(),
            self.config.sample_rate,
            start_index,
            self.state,
            channels,
            BandPower::from_weights(&weights),
            channel_quality,
        )?;

        self.next_sequence += 1;
        self.stats.frames_emitted += 1;
        self.stats.samples_emitted += count as u64;
        Ok(frame)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> BrainState {
        self.state
    }

    pub fn sample_index(&self) -> u64 {
        self.pacer.sample_index()
    }

    pub fn sample_debt(&self) -> f64 {
        self.pacer.sample_debt()
    }

    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }
}

/// Producer running on its own tokio task
pub struct RealTimeProducer {
    producer: SignalProducer,
    event_sender: mpsc::Sender<ProducerEvent>,
    control_receiver: mpsc::Receiver<ProducerCommand>,
    stats_sender: watch::Sender<ProducerStats>,
}

impl RealTimeProducer {
    /// Create the producer together with the consumer-facing ends of its channels
    pub fn new(
        config: ProducerConfig,
    ) -> NsResult<(Self, mpsc::Receiver<ProducerEvent>, ProducerHandle)> {
        let producer = SignalProducer::new(config)?;
        let (event_sender, event_receiver) = mpsc::channel(producer.config().event_capacity);
        let (control_sender, control_receiver) = mpsc::channel(CONTROL_CAPACITY);
        let (stats_sender, stats_receiver) = watch::channel(producer.stats().clone());

        let handle = ProducerHandle {
            commands: control_sender,
            stats: stats_receiver,
        };

        Ok((
            RealTimeProducer {
                producer,
                event_sender,
                control_receiver,
                stats_sender,
            },
            event_receiver,
            handle,
        ))
    }

    /// Drive the producer until every control handle is dropped or the
    /// consumer goes away.
    pub async fn run(mut self) -> NsResult<()> {
        let tick_interval = self.producer.config().tick_interval();
        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            sample_rate = self.producer.config().sample_rate,
            tick_ms = self.producer.config().tick_interval_ms,
            "producer task started"
        );

        loop {
            tokio::select! {
                // Commands first, so a regime change applies before the next tick
                biased;

                command = self.control_receiver.recv() => {
                    let Some(command) = command else {
                        info!("producer control channel closed");
                        break;
                    };
                    if let Some(event) = self.producer.handle_command(command) {
                        if !self.emit(event).await {
                            break;
                        }
                    }
                    self.publish_stats();
                }

                _ = ticker.tick() => {
                    if !self.producer.is_running() {
                        continue;
                    }
                    let frame = self.producer.on_tick(Instant::now().into_std())?;
                    if let Some(frame) = frame {
                        if !self.emit(ProducerEvent::Frame(frame)).await {
                            break;
                        }
                    }
                    self.publish_stats();
                }
            }
        }

        Ok(())
    }

    /// Deliver an event without dropping it; waits if the consumer is behind.
    /// Returns false once the consumer side is gone.
    async fn emit(&self, event: ProducerEvent) -> bool {
        if self.event_sender.send(event).await.is_err() {
            info!("consumer dropped the event channel, producer exiting");
            return false;
        }
        true
    }

    fn publish_stats(&self) {
        self.stats_sender.send_replace(self.producer.stats().clone());
    }
}

/// Cloneable control handle for a running producer
#[derive(Clone)]
pub struct ProducerHandle {
    commands: mpsc::Sender<ProducerCommand>,
    stats: watch::Receiver<ProducerStats>,
}

impl ProducerHandle {
    pub async fn send(&self, command: ProducerCommand) -> NsResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| NsError::ChannelClosed { channel: CONTROL_CHANNEL })
    }

    /// Non-blocking send for callers outside the runtime, e.g. a render loop.
    /// A full queue is reported as `ChannelFull` so the caller can retry.
    pub fn try_send(&self, command: ProducerCommand) -> NsResult<()> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => NsError::ChannelFull { channel: CONTROL_CHANNEL },
            TrySendError::Closed(_) => NsError::ChannelClosed { channel: CONTROL_CHANNEL },
        })
    }

    pub async fn start(&self) -> NsResult<()> {
        self.send(ProducerCommand::Start).await
    }

    pub async fn stop(&self) -> NsResult<()> {
        self.send(ProducerCommand::Stop).await
    }

    pub async fn pause(&self) -> NsResult<()> {
        self.send(ProducerCommand::Pause).await
    }

    pub async fn set_state(&self, state: BrainState) -> NsResult<()> {
        self.send(ProducerCommand::SetState(state)).await
    }

    /// Parse and send a regime by name. Unknown names are rejected before
    /// anything reaches the producer.
    pub async fn set_state_by_name(&self, name: &str) -> NsResult<()> {
        let state: BrainState = name.parse()?;
        self.set_state(state).await
    }

    /// Latest published producer statistics
    pub fn stats(&self) -> ProducerStats {
        self.stats.borrow().clone()
    }
}

/// Spawn a producer on the current tokio runtime
pub fn spawn_producer(
    config: ProducerConfig,
) -> NsResult<(mpsc::Receiver<ProducerEvent>, ProducerHandle)> {
    let (producer, events, handle) = RealTimeProducer::new(config)?;

    tokio::spawn(async move {
        if let Err(e) = producer.run().await {
            tracing::error!("producer task failed: {}", e);
        }
    });

    Ok((events, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::{Band, Channel};
    use std::time::Instant as StdInstant;
    use tokio::time::sleep;

    fn test_config() -> ProducerConfig {
        ProducerConfig {
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(ProducerConfig::default().validate().is_ok());

        let bad_rate = ProducerConfig { sample_rate: 0.0, ..Default::default() };
        assert!(matches!(bad_rate.validate(), Err(NsError::InvalidSamplingRate { .. })));

        let bad_tick = ProducerConfig { tick_interval_ms: -1.0, ..Default::default() };
        assert!(matches!(bad_tick.validate(), Err(NsError::InvalidConfig { .. })));

        let bad_gap = ProducerConfig { resume_gap_factor: 1.0, ..Default::default() };
        assert!(bad_gap.validate().is_err());

        for tick_interval_ms in [1e-7, 0.5, 1001.0, 1e30, f32::NAN, f32::INFINITY] {
            let config = ProducerConfig { tick_interval_ms, ..Default::default() };
            assert!(
                matches!(config.validate(), Err(NsError::InvalidConfig { .. })),
                "tick {} accepted",
                tick_interval_ms
            );
            assert!(SignalProducer::new(config).is_err());
        }
        for resume_gap_factor in [1001.0, 1e30, f32::NAN, f32::INFINITY] {
            let config = ProducerConfig { resume_gap_factor, ..Default::default() };
            assert!(matches!(config.validate(), Err(NsError::InvalidConfig { .. })));
            assert!(SignalProducer::new(config).is_err());
        }

        // both ends of the accepted ranges build a producer
        let edges = ProducerConfig {
            tick_interval_ms: MIN_TICK_INTERVAL_MS,
            resume_gap_factor: MAX_RESUME_GAP_FACTOR,
            ..Default::default()
        };
        assert!(SignalProducer::new(edges).is_ok());
        let edges = ProducerConfig {
            tick_interval_ms: MAX_TICK_INTERVAL_MS,
            resume_gap_factor: MIN_RESUME_GAP_FACTOR,
            ..Default::default()
        };
        assert!(SignalProducer::new(edges).is_ok());

        let bad_capacity = ProducerConfig { event_capacity: 0, ..Default::default() };
        assert!(bad_capacity.validate().is_err());
    }

    #[test]
    fn test_stopped_producer_emits_nothing() {
        let mut producer = SignalProducer::new(test_config()).unwrap();
        let t0 = StdInstant::now();
        assert!(producer.on_tick(t0).unwrap().is_none());
        assert!(producer.on_tick(t0 + Duration::from_secs(1)).unwrap().is_none());
        assert_eq!(producer.sample_index(), 0);
    }

    #[test]
    fn test_start_then_three_16ms_ticks() {
        let mut producer = SignalProducer::new(test_config()).unwrap();
        producer.handle_command(ProducerCommand::Start);

        let t0 = StdInstant::now();
        assert!(producer.on_tick(t0).unwrap().is_none());

        let mut frames = Vec::new();
        for i in 1..=3 {
            if let Some(frame) = producer.on_tick(t0 + Duration::from_millis(16 * i)).unwrap() {
                frames.push(frame);
            }
            assert!(producer.sample_debt() < 1.0);
        }

        let total: usize = frames.iter().map(|f| f.sample_count()).sum();
        assert_eq!(total, 12);
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.sequence, i as u64);
            assert_eq!(frame.start_index, 4 * i as u64);
            assert_eq!(frame.sample_rate, 256.0);
            for channel in Channel::ALL {
                assert_eq!(frame.channel(channel).len(), 4);
            }
        }
        assert_eq!(producer.stats().samples_emitted, 12);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut producer = SignalProducer::new(test_config()).unwrap();
        let t0 = StdInstant::now();

        producer.start();
        producer.on_tick(t0).unwrap();
        producer.on_tick(t0 + Duration::from_millis(40)).unwrap();
        let index = producer.sample_index();

        // a second start must not re-baseline mid-run
        producer.start();
        let frame = producer.on_tick(t0 + Duration::from_millis(80)).unwrap();
        assert!(frame.is_some());
        assert!(producer.sample_index() > index);

        producer.stop();
        producer.stop();
        assert!(!producer.is_running());
        assert_eq!(producer.sample_index(), 0);
        assert_eq!(producer.sample_debt(), 0.0);
    }

    #[test]
    fn test_restart_does_not_replay_stopped_time() {
        let mut producer = SignalProducer::new(test_config()).unwrap();
        let t0 = StdInstant::now();

        producer.start();
        producer.on_tick(t0).unwrap();
        producer.on_tick(t0 + Duration::from_millis(16)).unwrap();
        producer.stop();

        // restart 100ms later: first tick is a fresh baseline
        producer.start();
        let t1 = t0 + Duration::from_millis(116);
        assert!(producer.on_tick(t1).unwrap().is_none());
        let frame = producer.on_tick(t1 + Duration::from_millis(16)).unwrap().unwrap();
        assert_eq!(frame.sample_count(), 4);
        assert_eq!(frame.start_index, 0);
        assert_eq!(frame.sequence, 0);
    }

    #[test]
    fn test_pause_keeps_sample_index() {
        let mut producer = SignalProducer::new(test_config()).unwrap();
        let t0 = StdInstant::now();

        producer.start();
        producer.on_tick(t0).unwrap();
        producer.on_tick(t0 + Duration::from_millis(32)).unwrap();
        let index = producer.sample_index();
        assert_eq!(index, 8);

        producer.handle_command(ProducerCommand::Pause);
        assert!(!producer.is_running());
        assert!(producer.on_tick(t0 + Duration::from_millis(48)).unwrap().is_none());

        producer.start();
        let t1 = t0 + Duration::from_secs(5);
        producer.on_tick(t1).unwrap();
        let frame = producer.on_tick(t1 + Duration::from_millis(16)).unwrap().unwrap();
        assert_eq!(frame.start_index, index);
    }

    #[test]
    fn test_every_set_state_flushes() {
        let mut producer = SignalProducer::new(test_config()).unwrap();

        let first = producer.handle_command(ProducerCommand::SetState(BrainState::Rem));
        let second = producer.handle_command(ProducerCommand::SetState(BrainState::Rem));

        assert_eq!(first, Some(ProducerEvent::Flush { state: BrainState::Rem }));
        assert_eq!(second, Some(ProducerEvent::Flush { state: BrainState::Rem }));
        assert_eq!(producer.stats().flushes, 2);
        assert_eq!(producer.handle_command(ProducerCommand::Start), None);
    }

    #[test]
    fn test_state_change_applies_to_subsequent_frames_only() {
        let mut producer = SignalProducer::new(test_config()).unwrap();
        let t0 = StdInstant::now();
        producer.start();
        producer.on_tick(t0).unwrap();

        let in_flight = producer.on_tick(t0 + Duration::from_millis(16)).unwrap().unwrap();
        let relaxed_power = BandPower::from_weights(&BrainState::Relaxed.weights());
        assert_eq!(in_flight.band_power, relaxed_power);

        producer.set_state(BrainState::Rem);

        // the frame already emitted is untouched
        assert_eq!(in_flight.state, BrainState::Relaxed);
        assert_eq!(in_flight.band_power, relaxed_power);
        assert_eq!(in_flight.band_power.dominant(), Band::Alpha);

        let next = producer.on_tick(t0 + Duration::from_millis(32)).unwrap().unwrap();
        assert_eq!(next.state, BrainState::Rem);
        assert_eq!(next.band_power.dominant(), Band::Delta);
    }

    #[test]
    fn test_long_gap_is_counted_as_resync() {
        let mut producer = SignalProducer::new(test_config()).unwrap();
        let t0 = StdInstant::now();
        producer.start();
        producer.on_tick(t0).unwrap();

        assert!(producer.on_tick(t0 + Duration::from_secs(10)).unwrap().is_none());
        assert_eq!(producer.stats().resyncs, 1);
        assert_eq!(producer.sample_index(), 0);
    }

    #[tokio::test]
    async fn test_real_time_producer_streams_frames() {
        let (mut events, handle) = spawn_producer(test_config()).unwrap();

        handle.start().await.unwrap();
        sleep(Duration::from_millis(250)).await;
        handle.stop().await.unwrap();

        let mut frames = 0;
        let mut samples = 0;
        let mut next_index = 0;
        while let Ok(event) = events.try_recv() {
            if let ProducerEvent::Frame(frame) = event {
                assert_eq!(frame.start_index, next_index);
                next_index += frame.sample_count() as u64;
                frames += 1;
                samples += frame.sample_count();
            }
        }

        assert!(frames >= 3, "expected several frames, got {}", frames);
        // ~64 samples in 250ms; generous bounds for CI scheduling
        assert!(samples >= 20 && samples <= 120, "samples = {}", samples);
    }

    #[tokio::test]
    async fn test_try_send_full_and_closed() {
        // the task is never run, so nothing drains the control queue
        let (producer, _events, handle) = RealTimeProducer::new(test_config()).unwrap();

        for _ in 0..CONTROL_CAPACITY {
            handle.try_send(ProducerCommand::Start).unwrap();
        }
        assert_eq!(
            handle.try_send(ProducerCommand::Start),
            Err(NsError::ChannelFull { channel: "producer control" })
        );

        drop(producer);
        assert_eq!(
            handle.try_send(ProducerCommand::Start),
            Err(NsError::ChannelClosed { channel: "producer control" })
        );
        assert!(matches!(handle.start().await, Err(NsError::ChannelClosed { .. })));
    }

    #[tokio::test]
    async fn test_shortest_tick_runs() {
        let config = ProducerConfig {
            tick_interval_ms: MIN_TICK_INTERVAL_MS,
            ..test_config()
        };
        let (mut events, handle) = spawn_producer(config).unwrap();

        handle.start().await.unwrap();
        sleep(Duration::from_millis(60)).await;
        handle.pause().await.unwrap();

        let mut samples = 0;
        while let Ok(event) = events.try_recv() {
            if let ProducerEvent::Frame(frame) = event {
                samples += frame.sample_count();
            }
        }
        assert!(samples > 0);
        // the task is still alive and answering commands
        handle.stop().await.unwrap();
        sleep(Duration::from_millis(10)).await;
        assert!(!handle.stats().is_running);
    }

    #[tokio::test]
    async fn test_real_time_producer_flush_and_unknown_state() {
        let (mut events, handle) = spawn_producer(test_config()).unwrap();

        handle.set_state_by_name("Focused").await.unwrap();
        handle.set_state_by_name("Focused").await.unwrap();

        let err = handle.set_state_by_name("Hypnotic").await.unwrap_err();
        assert!(matches!(err, NsError::UnknownState { .. }));

        let first = events.recv().await.unwrap();
        let second = events.recv().await.unwrap();
        assert_eq!(first, ProducerEvent::Flush { state: BrainState::Focused });
        assert_eq!(second, ProducerEvent::Flush { state: BrainState::Focused });

        sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.stats().flushes, 2);
        assert_eq!(handle.stats().state, BrainState::Focused);
    }
}

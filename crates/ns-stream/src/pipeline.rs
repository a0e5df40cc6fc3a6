//! Producer-to-consumer wiring
//!
//! The producer runs on its own task; the consumer side lives wherever the
//! render loop lives and drains inbound events once per refresh.

use crate::config::StreamConfig;
use crate::consumer::RingBufferConsumer;
use crate::export::export_to_dir;
use ns_core::{BrainState, NsResult};
use ns_simulation::{spawn_producer, ProducerEvent, ProducerHandle, ProducerStats};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info};

/// What a single `poll` applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub frames: usize,
    pub samples: usize,
    pub flushes: usize,
    /// The producer side has gone away
    pub disconnected: bool,
}

/// Consumer end of the event channel
pub struct StreamMonitor {
    events: mpsc::Receiver<ProducerEvent>,
    consumer: RingBufferConsumer,
}

impl StreamMonitor {
    pub fn new(events: mpsc::Receiver<ProducerEvent>, consumer: RingBufferConsumer) -> Self {
        Self { events, consumer }
    }

    /// Apply every event already queued, in arrival order, without waiting
    pub fn poll(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();
        let now = Instant::now();

        loop {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    summary.disconnected = true;
                    break;
                }
            };

            match &event {
                ProducerEvent::Frame(frame) => {
                    summary.frames += 1;
                    summary.samples += frame.sample_count();
                }
                ProducerEvent::Flush { .. } => summary.flushes += 1,
            }
            self.consumer.handle_event(event, now);
        }

        if summary.frames > 0 || summary.flushes > 0 {
            debug!(
                frames = summary.frames,
                samples = summary.samples,
                flushes = summary.flushes,
                "events applied"
            );
        }
        summary
    }

    /// Wait for the next event and apply it. Returns false once the producer is gone.
    pub async fn next(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.consumer.handle_event(event, Instant::now());
                true
            }
            None => false,
        }
    }

    pub fn consumer(&self) -> &RingBufferConsumer {
        &self.consumer
    }

    /// Export the currently retained history
    pub fn export_to_dir(&self, dir: &Path) -> NsResult<Option<PathBuf>> {
        export_to_dir(dir, self.consumer.history().iter())
    }
}

/// A running producer together with its consumer
pub struct SignalPipeline {
    handle: ProducerHandle,
    monitor: StreamMonitor,
    config: StreamConfig,
}

impl SignalPipeline {
    /// Spawn the producer on the current runtime. The producer starts stopped.
    pub fn spawn(config: StreamConfig) -> NsResult<Self> {
        config.validate()?;

        let consumer = RingBufferConsumer::new(config.consumer.clone())?;
        let (events, handle) = spawn_producer(config.producer.clone())?;

        info!(
            sample_rate = config.producer.sample_rate,
            ring_capacity = config.consumer.ring_capacity,
            history_frames = config.consumer.history_frames,
            "pipeline ready"
        );

        Ok(Self {
            handle,
            monitor: StreamMonitor::new(events, consumer),
            config,
        })
    }

    pub fn handle(&self) -> &ProducerHandle {
        &self.handle
    }

    pub fn monitor(&self) -> &StreamMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut StreamMonitor {
        &mut self.monitor
    }

    pub fn poll(&mut self) -> PollSummary {
        self.monitor.poll()
    }

    pub fn consumer(&self) -> &RingBufferConsumer {
        self.monitor.consumer()
    }

    pub async fn start(&self) -> NsResult<()> {
        self.handle.start().await
    }

    pub async fn stop(&self) -> NsResult<()> {
        self.handle.stop().await
    }

    pub async fn pause(&self) -> NsResult<()> {
        self.handle.pause().await
    }

    pub async fn set_state(&self, state: BrainState) -> NsResult<()> {
        self.handle.set_state(state).await
    }

    pub fn producer_stats(&self) -> ProducerStats {
        self.handle.stats()
    }

    /// Export the retained history into the configured export directory
    pub fn export(&self) -> NsResult<Option<PathBuf>> {
        self.monitor.export_to_dir(&self.config.export_dir)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

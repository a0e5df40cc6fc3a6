//! Headless session driver: runs the pipeline and reports what the consumer sees

use anyhow::{Context, Result};
use ns_core::{BrainState, Channel};
use ns_stream::{SignalPipeline, StreamConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// What a single session should do
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub duration: Duration,
    /// Regime to switch to, and when
    pub switch: Option<(BrainState, Duration)>,
    /// Consumer refresh period, standing in for the display refresh
    pub refresh: Duration,
    pub report_every: Duration,
    pub export: bool,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            switch: None,
            refresh: Duration::from_millis(16),
            report_every: Duration::from_secs(1),
            export: true,
        }
    }
}

pub struct ConsoleApp {
    pipeline: SignalPipeline,
    refresh_count: u64,
}

impl ConsoleApp {
    pub fn new(config: StreamConfig) -> Result<Self> {
        let pipeline = SignalPipeline::spawn(config).context("failed to start pipeline")?;
        Ok(Self {
            pipeline,
            refresh_count: 0,
        })
    }

    /// Stream for `plan.duration`, then export. Returns the export path, if any.
    pub async fn run(&mut self, plan: &RunPlan) -> Result<Option<PathBuf>> {
        let mut refresh = interval(plan.refresh);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.pipeline.start().await?;
        let started = Instant::now();
        let mut last_report = started;
        let mut pending_switch = plan.switch;

        loop {
            refresh.tick().await;
            let summary = self.pipeline.poll();
            self.refresh_count += 1;

            if summary.disconnected {
                warn!("producer went away, ending session early");
                break;
            }

            let elapsed = started.elapsed();
            if let Some((state, at)) = pending_switch {
                if elapsed >= at {
                    info!(state = %state, "switching regime");
                    self.pipeline.set_state(state).await?;
                    pending_switch = None;
                }
            }

            if last_report.elapsed() >= plan.report_every {
                self.report();
                last_report = Instant::now();
            }

            if elapsed >= plan.duration {
                break;
            }
        }

        // pause keeps the history intact for export
        self.pipeline.pause().await?;
        tokio::time::sleep(plan.refresh).await;
        self.pipeline.poll();
        self.report();

        let exported = if plan.export {
            self.pipeline.export().context("export failed")?
        } else {
            None
        };
        match &exported {
            Some(path) => info!(path = %path.display(), "session exported"),
            None if plan.export => info!("nothing to export"),
            None => {}
        }

        self.pipeline.stop().await?;
        Ok(exported)
    }

    fn report(&self) {
        let consumer = self.pipeline.consumer();
        let stats = self.pipeline.producer_stats();
        let power = consumer.band_power();

        let bands = power
            .iter()
            .map(|(band, pct)| format!("{}={:.1}%", band, pct))
            .collect::<Vec<_>>()
            .join(" ");
        let measured = consumer
            .measured_rate()
            .map(|rate| format!("{:.1}Hz", rate))
            .unwrap_or_else(|| "-".to_string());
        let quality = Channel::ALL
            .iter()
            .map(|ch| format!("{}:{}", ch, consumer.quality_label(*ch)))
            .collect::<Vec<_>>()
            .join(" ");
        // amplitude over the retained window, on the midline reference
        let cz = consumer.channel_stats(Channel::Cz);

        info!(
            state = %consumer.state(),
            measured = %measured,
            cursor = consumer.write_cursor(),
            history = consumer.history().len(),
            frames = stats.frames_emitted,
            resyncs = stats.resyncs,
            cz_rms = cz.rms,
            cz_p2p = cz.peak_to_peak,
            "{} | {}",
            bands,
            quality
        );
    }

    pub fn pipeline(&self) -> &SignalPipeline {
        &self.pipeline
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }
}

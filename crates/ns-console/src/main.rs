//! NeuroStream console - headless EEG acquisition session

mod app;

use anyhow::{Context, Result};
use app::{ConsoleApp, RunPlan};
use clap::Parser;
use ns_core::BrainState;
use ns_stream::StreamConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neurostream")]
#[command(about = "Synthetic 8-channel EEG producer/consumer pipeline", long_about = None)]
struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial regime (relaxed, focused, alert, rem)
    #[arg(short, long)]
    state: Option<BrainState>,

    /// Session length in seconds
    #[arg(short, long, default_value = "10.0")]
    duration: f32,

    /// Regime to switch to mid-session
    #[arg(long)]
    switch_to: Option<BrainState>,

    /// Seconds into the session at which to switch
    #[arg(long, default_value = "5.0")]
    switch_after: f32,

    /// Directory for the CSV export
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Skip the export at the end of the session
    #[arg(long)]
    no_export: bool,

    /// Seed for reproducible noise
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds between status lines
    #[arg(long, default_value = "1.0")]
    report_interval: f32,
}

impl Cli {
    fn stream_config(&self) -> Result<StreamConfig> {
        let mut config = match &self.config {
            Some(path) => StreamConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => StreamConfig::default(),
        };

        if let Some(state) = self.state {
            config.producer.initial_state = state;
        }
        if let Some(seed) = self.seed {
            config.producer.seed = Some(seed);
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn run_plan(&self) -> Result<RunPlan> {
        Ok(RunPlan {
            duration: seconds(self.duration, "duration")?,
            switch: match self.switch_to {
                Some(state) => Some((state, seconds(self.switch_after, "switch-after")?)),
                None => None,
            },
            report_every: seconds(self.report_interval, "report-interval")?,
            export: !self.no_export,
            ..Default::default()
        })
    }
}

fn seconds(value: f32, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f32(value).with_context(|| format!("--{} must be a non-negative number of seconds", flag))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.stream_config()?;
    let plan = cli.run_plan()?;

    info!(
        state = %config.producer.initial_state,
        sample_rate = config.producer.sample_rate,
        duration_secs = plan.duration.as_secs_f32(),
        "starting NeuroStream session"
    );

    let mut app = ConsoleApp::new(config)?;
    if let Some(path) = app.run(&plan).await? {
        println!("{}", path.display());
    }

    Ok(())
}

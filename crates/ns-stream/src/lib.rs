//! NS-Stream: consumer side of the acquisition pipeline
//!
//! Ring buffers, rolling quality and throughput, bounded frame history,
//! CSV export, and the glue that connects a running producer to them.

pub mod config;
pub mod consumer;
pub mod export;
pub mod history;
pub mod pipeline;
pub mod ring_buffer;
pub mod throughput;

pub use config::StreamConfig;
pub use consumer::{ConsumerConfig, RingBufferConsumer, SignalSnapshot};
pub use export::{export_filename, export_to_dir, write_csv, ExportSummary};
pub use history::FrameHistory;
pub use pipeline::{PollSummary, SignalPipeline, StreamMonitor};
pub use ring_buffer::RingBuffer;
pub use throughput::ThroughputMeter;

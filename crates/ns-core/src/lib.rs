//! NS-Core: Foundation types for the NeuroStream acquisition pipeline
//!
//! Channel, band and regime tables shared by the producer and the consumer,
//! plus the `Frame` message that travels between them.

pub mod eeg_types;
pub mod error;
pub mod frame;

pub use eeg_types::*;
pub use error::{NsError, NsResult};
pub use frame::*;

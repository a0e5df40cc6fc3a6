//! Error handling for the NeuroStream pipeline
//!
//! Almost every value in the pipeline is generated internally, so the
//! taxonomy is small: configuration mistakes, malformed frames, unknown
//! regime names and transport/export failures.

use core::fmt;

/// Result type alias for NeuroStream operations
pub type NsResult<T> = Result<T, NsError>;

/// Error type for all NeuroStream operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NsError {
    /// A regime name that is not one of the enumerated states
    UnknownState {
        /// The rejected name
        name: String,
    },

    /// Invalid pipeline configuration
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Sampling rate outside the supported range
    InvalidSamplingRate {
        /// Provided sampling rate
        rate: f32,
        /// Valid range description
        valid_range: String,
    },

    /// Frame whose channels disagree on sample count, or carry bad values
    MalformedFrame {
        /// Description of the shape problem
        reason: String,
    },

    /// The other end of a producer/consumer channel went away
    ChannelClosed {
        /// Which channel closed
        channel: &'static str,
    },

    /// A bounded channel is at capacity; the other end is still alive
    ChannelFull {
        /// Which channel is full
        channel: &'static str,
    },

    /// Writing an export artifact failed
    ExportFailed {
        /// Underlying I/O error description
        message: String,
    },
}

impl fmt::Display for NsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NsError::UnknownState { name } => {
                write!(f, "Unknown signal regime '{}', expected one of Relaxed, Focused, Alert, REM", name)
            }
            NsError::InvalidConfig { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            NsError::InvalidSamplingRate { rate, valid_range } => {
                write!(f, "Invalid sampling rate: {}Hz, valid range: {}", rate, valid_range)
            }
            NsError::MalformedFrame { reason } => {
                write!(f, "Malformed frame: {}", reason)
            }
            NsError::ChannelClosed { channel } => {
                write!(f, "{} channel closed", channel)
            }
            NsError::ChannelFull { channel } => {
                write!(f, "{} channel full", channel)
            }
            NsError::ExportFailed { message } => {
                write!(f, "Export failed: {}", message)
            }
        }
    }
}

impl std::error::Error for NsError {}

impl From<std::io::Error> for NsError {
    fn from(err: std::io::Error) -> Self {
        NsError::ExportFailed {
            message: err.to_string(),
        }
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::NsError::InvalidConfig {
            reason: format!($($arg)*),
        }
    };
}

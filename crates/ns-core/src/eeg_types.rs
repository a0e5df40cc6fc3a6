//! EEG channel, band and regime tables
//!
//! Everything here is a process-wide constant. Per-channel lookups are plain
//! `match` tables over a closed enum, indexed the same way everywhere so a
//! `[T; CHANNEL_COUNT]` can stand in for a channel-keyed map.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::NsError;

/// Number of electrode channels in the montage
pub const CHANNEL_COUNT: usize = 8;

/// Number of frequency bands
pub const BAND_COUNT: usize = 5;

/// Electrode channels in fixed export/render order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    Fp1,
    Fp2,
    Fz,
    Cz,
    Pz,
    O1,
    O2,
    T3,
}

impl Channel {
    /// All channels, in column order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Fp1,
        Channel::Fp2,
        Channel::Fz,
        Channel::Cz,
        Channel::Pz,
        Channel::O1,
        Channel::O2,
        Channel::T3,
    ];

    /// Position of this channel in every per-channel array
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Fp1 => "Fp1",
            Channel::Fp2 => "Fp2",
            Channel::Fz => "Fz",
            Channel::Cz => "Cz",
            Channel::Pz => "Pz",
            Channel::O1 => "O1",
            Channel::O2 => "O2",
            Channel::T3 => "T3",
        }
    }

    /// Scalp location label shown next to the trace
    pub const fn location(self) -> &'static str {
        match self {
            Channel::Fp1 => "front-left",
            Channel::Fp2 => "front-right",
            Channel::Fz => "center-front",
            Channel::Cz => "crown",
            Channel::Pz => "center-back",
            Channel::O1 => "occipital-L",
            Channel::O2 => "occipital-R",
            Channel::T3 => "temporal-L",
        }
    }

    /// Phase offset (radians) per band, indexed by `Band::index`
    pub const fn phase_offsets(self) -> [f32; BAND_COUNT] {
        match self {
            Channel::Fp1 => [0.0, 0.3, 0.7, 1.1, 0.5],
            Channel::Fp2 => [0.5, 0.9, 0.2, 0.6, 1.3],
            Channel::Fz => [1.0, 0.1, 1.4, 0.3, 0.8],
            Channel::Cz => [0.3, 1.2, 0.5, 1.8, 0.2],
            Channel::Pz => [0.8, 0.4, 1.1, 0.9, 1.6],
            Channel::O1 => [0.2, 0.7, 1.9, 0.4, 0.9],
            Channel::O2 => [1.5, 0.0, 0.3, 1.3, 0.4],
            Channel::T3 => [0.6, 1.5, 0.8, 0.2, 1.1],
        }
    }

    /// Fixed gain applied after band summation.
    ///
    /// Chosen so the largest regime weight sum lands near full scale without
    /// routinely hitting the [-1, 1] clip.
    pub const fn amplitude_scale(self) -> f32 {
        match self {
            Channel::Fp1 => 0.46,
            Channel::Fp2 => 0.44,
            Channel::Fz => 0.42,
            Channel::Cz => 0.40,
            Channel::Pz => 0.43,
            Channel::O1 => 0.45,
            Channel::O2 => 0.44,
            Channel::T3 => 0.38,
        }
    }

    /// Contact quality of the electrode with no regime noise
    pub const fn baseline_quality(self) -> f32 {
        match self {
            Channel::Fp1 => 0.92,
            Channel::Fp2 => 0.88,
            Channel::Fz => 0.95,
            Channel::Cz => 0.97,
            Channel::Pz => 0.85,
            Channel::O1 => 0.91,
            Channel::O2 => 0.78,
            Channel::T3 => 0.62,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Frequency bands in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; BAND_COUNT] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    /// Representative frequency used by the synthesizer (Hz)
    pub const fn frequency_hz(self) -> f32 {
        match self {
            Band::Delta => 2.0,
            Band::Theta => 6.0,
            Band::Alpha => 10.0,
            Band::Beta => 20.0,
            Band::Gamma => 40.0,
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Band and noise weights owned by one regime.
///
/// Weights are intentionally not normalized: a regime with larger weights
/// produces a visibly larger trace, not just a differently shaped one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateWeights {
    /// One weight per band, indexed by `Band::index`. Read through `band`,
    /// which treats negative and NaN entries as zero.
    pub bands: [f32; BAND_COUNT],
    /// Scale of the Gaussian noise term
    pub noise: f32,
}

impl StateWeights {
    pub const fn new(bands: [f32; BAND_COUNT], noise: f32) -> Self {
        Self { bands, noise }
    }

    /// Effective weight of one band, never negative
    #[inline]
    pub fn band(&self, band: Band) -> f32 {
        self.bands[band.index()].max(0.0)
    }

    /// True when no band contributes anything
    pub fn is_silent(&self) -> bool {
        Band::ALL.into_iter().all(|band| self.band(band) <= 0.0)
    }
}

/// Selectable signal regime
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrainState {
    #[default]
    Relaxed,
    Focused,
    Alert,
    #[serde(rename = "REM")]
    Rem,
}

impl BrainState {
    pub const ALL: [BrainState; 4] = [
        BrainState::Relaxed,
        BrainState::Focused,
        BrainState::Alert,
        BrainState::Rem,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BrainState::Relaxed => "Relaxed",
            BrainState::Focused => "Focused",
            BrainState::Alert => "Alert",
            BrainState::Rem => "REM",
        }
    }

    /// Immutable weight vector for this regime
    pub const fn weights(self) -> StateWeights {
        match self {
            BrainState::Relaxed => StateWeights::new([0.2, 0.3, 1.0, 0.3, 0.1], 0.08),
            BrainState::Focused => StateWeights::new([0.1, 0.2, 0.4, 1.0, 0.3], 0.10),
            BrainState::Alert => StateWeights::new([0.1, 0.1, 0.2, 0.8, 1.0], 0.16),
            BrainState::Rem => StateWeights::new([1.0, 0.8, 0.2, 0.1, 0.05], 0.06),
        }
    }
}

impl std::fmt::Display for BrainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BrainState {
    type Err = NsError;

    /// Parse a regime name, case-insensitively. Anything else is rejected
    /// instead of falling back to a default regime.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        BrainState::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| NsError::UnknownState {
                name: s.to_string(),
            })
    }
}

/// Coarse quality bucket used by channel indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLabel {
    Good,
    Fair,
    Poor,
}

impl QualityLabel {
    pub fn from_score(quality: f32) -> Self {
        if quality > 0.75 {
            QualityLabel::Good
        } else if quality > 0.45 {
            QualityLabel::Fair
        } else {
            QualityLabel::Poor
        }
    }
}

impl std::fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityLabel::Good => write!(f, "good"),
            QualityLabel::Fair => write!(f, "fair"),
            QualityLabel::Poor => write!(f, "poor"),
        }
    }
}

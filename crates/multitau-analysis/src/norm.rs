//! Normalization modes.
//!
//! A mode is the combination of three independent choices. Each one maps
//! to a bit of the integer code (0–7) used by analysis scripts:
//!
//! | bit | axis | `0` | `1` |
//! |---|---|---|---|
//! | 1 | [`Scaling`] | `Variance` | `Compensated` |
//! | 2 | [`Baseline`] | `Background` | `Subtracted` |
//! | 4 | [`Blend`] | `None` | `Weighted` |

use multitau_core::ConfigurationError;

/// What is subtracted from the raw correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Baseline {
    /// Product of the global backgrounds, `b1·conj(b2)`.
    #[default]
    Background,
    /// Per-lag means, so that drifts of the mean over the run cancel.
    Subtracted,
}

/// What the correlation is divided by when scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Scaling {
    /// Global variance `sqrt(v1·v2)`.
    #[default]
    Variance,
    /// Per-lag power around the background, which compensates for the
    /// statistics of the frames that actually entered each lag.
    Compensated,
}

/// Optional blending with the structure-function estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Blend {
    #[default]
    None,
    /// Weighted average of the correlation and structure-function
    /// estimates, weights chosen by their expected errors.
    Weighted,
}

/// Normalization mode.
///
/// # Example
///
/// ```
/// use multitau_analysis::{Baseline, Blend, NormMode, Scaling};
///
/// let mode = NormMode::try_from(6).unwrap();
/// assert_eq!(mode.baseline, Baseline::Subtracted);
/// assert_eq!(mode.scaling, Scaling::Variance);
/// assert_eq!(mode.blend, Blend::Weighted);
/// assert_eq!(mode.bits(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NormMode {
    pub baseline: Baseline,
    pub scaling: Scaling,
    pub blend: Blend,
}

impl Default for NormMode {
    /// Mode 3: subtracted baseline, compensated scaling.
    fn default() -> Self {
        Self::new(Baseline::Subtracted, Scaling::Compensated, Blend::None)
    }
}

impl NormMode {
    pub const fn new(baseline: Baseline, scaling: Scaling, blend: Blend) -> Self {
        Self {
            baseline,
            scaling,
            blend,
        }
    }

    /// Integer code of this mode.
    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.scaling == Scaling::Compensated {
            bits |= 1;
        }
        if self.baseline == Baseline::Subtracted {
            bits |= 2;
        }
        if self.blend == Blend::Weighted {
            bits |= 4;
        }
        bits
    }

    /// All 8 modes in code order.
    pub fn all() -> impl Iterator<Item = NormMode> {
        (0u8..8).map(Self::from_bits)
    }

    /// Whether normalizing in this mode divides by a variance term.
    pub fn uses_variance(self, scale: bool) -> bool {
        scale || self.blend == Blend::Weighted
    }

    fn from_bits(bits: u8) -> Self {
        Self {
            scaling: if bits & 1 != 0 {
                Scaling::Compensated
            } else {
                Scaling::Variance
            },
            baseline: if bits & 2 != 0 {
                Baseline::Subtracted
            } else {
                Baseline::Background
            },
            blend: if bits & 4 != 0 {
                Blend::Weighted
            } else {
                Blend::None
            },
        }
    }
}

impl TryFrom<u8> for NormMode {
    type Error = ConfigurationError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits > 7 {
            return Err(ConfigurationError::InvalidMode(bits));
        }
        Ok(Self::from_bits(bits))
    }
}

impl From<NormMode> for u8 {
    fn from(mode: NormMode) -> u8 {
        mode.bits()
    }
}

impl core::fmt::Display for NormMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "norm {}", self.bits())
    }
}

//! Timing resolution for transition requests.
//!
//! A request carries optional overrides; the node merges them over its
//! `TimingDefaults` and stamps the result with the capture time. Every
//! transition spawned by one request shares that snapshot.

use serde::{Deserialize, Serialize};

use super::easing::{Easing, EasingFunction};
use super::error::{Result, TransitionError};

/// Default delay in time units (milliseconds for the system clock).
pub const DEFAULT_DELAY: f64 = 0.0;

/// Default duration in time units.
pub const DEFAULT_DURATION: f64 = 250.0;

/// Resolved timing of one transition request.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Capture time the delay is measured from.
    pub time: f64,
    pub delay: f64,
    pub duration: f64,
    pub ease: Easing,
}

impl Timing {
    /// Normalized, eased progress for `elapsed` time since the delay ended.
    ///
    /// Returns 1 once `elapsed` reaches the duration.
    pub fn progress(&self, elapsed: f64) -> f64 {
        if elapsed < self.duration {
            self.ease.evaluate(elapsed / self.duration)
        } else {
            1.0
        }
    }
}

/// Timing used when a request does not override a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingDefaults {
    pub delay: f64,
    pub duration: f64,
    pub ease: EasingFunction,
}

impl Default for TimingDefaults {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            duration: DEFAULT_DURATION,
            ease: EasingFunction::Linear,
        }
    }
}

impl TimingDefaults {
    /// Merge `overrides` over these defaults, captured at `time`.
    pub fn resolve(&self, overrides: &TimingOverrides, time: f64) -> Timing {
        Timing {
            time,
            delay: overrides.delay.unwrap_or(self.delay),
            duration: overrides.duration.unwrap_or(self.duration),
            ease: overrides
                .ease
                .clone()
                .unwrap_or(Easing::Preset(self.ease)),
        }
    }
}

/// Per-request timing overrides.
#[derive(Debug, Clone, Default)]
pub struct TimingOverrides {
    pub delay: Option<f64>,
    pub duration: Option<f64>,
    pub ease: Option<Easing>,
}

impl TimingOverrides {
    pub fn is_empty(&self) -> bool {
        self.delay.is_none() && self.duration.is_none() && self.ease.is_none()
    }

    /// Parse the `timing` entry of a JSON request.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let raw: RawTiming = serde_json::from_value(value.clone())
            .map_err(|e| TransitionError::InvalidTiming(e.to_string()))?;
        raw.try_into()
    }
}

/// Serialized form of `TimingOverrides`, as found under a request's
/// `timing` key. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTiming {
    pub delay: Option<f64>,
    pub duration: Option<f64>,
    pub ease: Option<EasingFunction>,
}

impl TryFrom<RawTiming> for TimingOverrides {
    type Error = TransitionError;

    fn try_from(raw: RawTiming) -> Result<Self> {
        for (name, value) in [("delay", raw.delay), ("duration", raw.duration)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(TransitionError::InvalidTiming(format!(
                        "{name} must be a non-negative number, got {v}"
                    )));
                }
            }
        }

        Ok(Self {
            delay: raw.delay,
            duration: raw.duration,
            ease: raw.ease.map(Easing::Preset),
        })
    }
}

//! Core value and identifier types.
//!
//! - `Value`: a primitive stored under a state key or namespace attribute
//! - `TransitionId`: monotonically increasing transition identifier
//! - `TransitionStatus`: lifecycle phase of a transition

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A primitive state value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value (positions, opacities, radii, ...).
    Number(f64),
    /// Text value (colors, transforms, labels, ...).
    Text(String),
}

impl Value {
    /// Try to extract a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Try to extract a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Unique identifier for a transition.
///
/// Ids are process-wide and strictly increasing, so for one state key a
/// larger id always means a later request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionId(pub u64);

impl TransitionId {
    /// Generate the next transition id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle phase of a transition, in order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStatus {
    /// Registered, waiting for the first frame.
    #[default]
    Exists,
    /// Waiting for its delay to elapse.
    Queued,
    /// Firing the `start` event.
    Starting,
    /// Tweens initialized, waiting for the deferred first tick.
    Started,
    /// Ticking every frame.
    Running,
    /// Final tick applied, about to fire `end`.
    Stopping,
    /// Terminal.
    Stopped,
}

impl TransitionStatus {
    /// True once the transition can no longer change state.
    pub fn is_terminal(self) -> bool {
        self == Self::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_exists() {
        assert_eq!(TransitionStatus::default(), TransitionStatus::Exists);
        assert!(!TransitionStatus::default().is_terminal());
    }

    #[test]
    fn test_ids_increase() {
        let a = TransitionId::next();
        let b = TransitionId::next();
        assert!(b > a);
    }

    #[test]
    fn test_status_order() {
        assert!(TransitionStatus::Exists < TransitionStatus::Queued);
        assert!(TransitionStatus::Started < TransitionStatus::Running);
        assert!(TransitionStatus::Stopping < TransitionStatus::Stopped);
        assert!(TransitionStatus::Stopped.is_terminal());
        assert!(!TransitionStatus::Running.is_terminal());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::from(2).as_f64(), Some(2.0));
        assert_eq!(Value::from("red").as_str(), Some("red"));
        assert_eq!(Value::from("red").as_f64(), None);
        assert_eq!(Value::from(0.25).to_string(), "0.25");
    }

    #[test]
    fn test_value_json() {
        let v: Value = serde_json::from_str("3").unwrap();
        assert_eq!(v, Value::Number(3.0));
        let v: Value = serde_json::from_str("\"rgb(0, 0, 0)\"").unwrap();
        assert_eq!(v, Value::Text("rgb(0, 0, 0)".to_string()));
    }
}

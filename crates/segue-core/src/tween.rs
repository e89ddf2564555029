//! Tween building.
//!
//! `build` turns one request target into tween factories, applying the
//! immediate writes (`Set`, the begin of `FromTo`) as it goes. A factory is
//! materialized when its transition starts: it reads the begin value at that
//! moment, so a superseding transition begins wherever the interrupted one
//! left off.

use std::fmt;

use super::error::Result;
use super::interpolate::{Interpolator, InterpolatorFactory};
use super::request::{CustomTween, Motion, Target};
use super::state::State;
use super::types::Value;

/// Where a tween reads and writes: a top-level key or a namespaced attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub attribute: String,
    pub namespace: Option<String>,
}

impl Slot {
    fn read<'a>(&self, state: &'a State) -> Option<&'a Value> {
        state.lookup(&self.attribute, self.namespace.as_deref())
    }

    fn write(&self, state: &mut State, value: Value) {
        state.write(&self.attribute, self.namespace.as_deref(), value);
    }
}

enum Source {
    End(Value),
    Custom(CustomTween),
}

/// Deferred tween, materialized at transition start.
pub struct TweenFactory {
    slot: Slot,
    source: Source,
}

impl TweenFactory {
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Capture the begin value and build the per-frame tween.
    ///
    /// Returns `None` when the current value already equals the end value.
    pub fn materialize<I>(&self, state: &State, interpolators: &I) -> Result<Option<Tween>>
    where
        I: InterpolatorFactory + ?Sized,
    {
        let end = match &self.source {
            Source::Custom(f) => {
                return Ok(Some(Tween {
                    slot: self.slot.clone(),
                    kind: TweenKind::Custom(f.clone()),
                }));
            }
            Source::End(end) => end,
        };

        let kind = match self.slot.read(state) {
            Some(begin) if begin == end => return Ok(None),
            Some(begin) => TweenKind::Interpolated(interpolators.interpolator(
                begin,
                end,
                &self.slot.attribute,
                self.slot.namespace.as_deref(),
            )?),
            None => TweenKind::Constant(end.clone()),
        };

        Ok(Some(Tween {
            slot: self.slot.clone(),
            kind,
        }))
    }
}

impl fmt::Debug for TweenFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::End(v) => format!("end {v}"),
            Source::Custom(_) => "custom".to_string(),
        };
        f.debug_struct("TweenFactory")
            .field("slot", &self.slot)
            .field("source", &source)
            .finish()
    }
}

enum TweenKind {
    Interpolated(Interpolator),
    Custom(CustomTween),
    /// No begin value to interpolate from.
    Constant(Value),
}

/// Per-frame setter for one attribute.
pub struct Tween {
    slot: Slot,
    kind: TweenKind,
}

impl Tween {
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Write the value at eased time `t`.
    pub fn apply(&self, state: &mut State, t: f64) {
        let value = match &self.kind {
            TweenKind::Interpolated(i) => i(t),
            TweenKind::Custom(f) => f(t),
            TweenKind::Constant(v) => v.clone(),
        };
        self.slot.write(state, value);
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween").field("slot", &self.slot).finish()
    }
}

/// Build the tween factories for `target` under `key`, writing immediate
/// values into `state`.
pub fn build(key: &str, target: Target, state: &mut State) -> Vec<TweenFactory> {
    match target {
        Target::Value(motion) => vec![build_motion(key, None, motion, state)],
        Target::Namespace(attrs) => attrs
            .into_iter()
            .map(|(attr, motion)| build_motion(&attr, Some(key), motion, state))
            .collect(),
    }
}

fn build_motion(attr: &str, ns: Option<&str>, motion: Motion, state: &mut State) -> TweenFactory {
    let slot = Slot {
        attribute: attr.to_string(),
        namespace: ns.map(str::to_string),
    };

    let source = match motion {
        Motion::Set(end) => {
            slot.write(state, end.clone());
            Source::End(end)
        }
        Motion::To(end) => Source::End(end),
        Motion::FromTo(begin, end) => {
            slot.write(state, begin);
            Source::End(end)
        }
        Motion::Custom(f) => Source::Custom(f),
    };

    TweenFactory { slot, source }
}

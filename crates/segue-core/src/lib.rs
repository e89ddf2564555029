//! Value-transition engine.
//!
//! This crate provides:
//! - **Nodes**: entities holding nested state and a transition scheduler
//! - **Requests**: which keys to move, how, with what timing and handlers
//! - **Interpolation**: numbers, CSS colors, SVG transforms, numeric strings
//! - **Easing Functions**: standard CSS timing functions and custom curves
//! - **Frame Clock**: timer queue driven by a manual or system clock
//!
//! # Architecture
//!
//! ```text
//! Node
//!   ├── State (key → value | namespace of values)
//!   ├── TimerQueue ((transition, step) actions, flushed by advance)
//!   └── Live transitions (one per state key per request)
//!         └── TweenFactory → Tween (per attribute, via InterpolatorFactory)
//! ```

pub mod easing;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod node;
pub mod request;
pub mod state;
pub mod timer;
pub mod timing;
pub mod transform;
pub mod tween;
pub mod types;

pub use easing::{Easing, EasingFunction, StepPosition};
pub use error::{Result, TransitionError};
pub use events::{EventKind, EventQueue, Handler, LifecycleEvent, LifecycleKind, RawEvents};
pub use interpolate::{
    Interpolate, Interpolator, InterpolatorFactory, NoInterpolation, StandardInterpolator,
};
pub use node::{EVENT_LOG_LIMIT, Entity, Node};
pub use request::{Batch, Motion, Request, Target};
pub use state::{Entry, Namespace, State};
pub use timer::{Clock, ManualClock, SystemClock, TimerHandle, TimerQueue};
pub use timing::{RawTiming, Timing, TimingDefaults, TimingOverrides};
pub use transform::{DecomposedTransform, Transform2D};
pub use types::{TransitionId, TransitionStatus, Value};

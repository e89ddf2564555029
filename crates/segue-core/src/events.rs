//! Transition lifecycle events.
//!
//! Two kinds of events live here:
//! - user handlers (`start`, `interrupt`, `end`) attached to a request, each
//!   invoked at most once with the owning entity
//! - `LifecycleEvent` records the node pushes onto an `EventQueue`, which
//!   callers can poll after advancing the clock
//!
//! # Usage
//!
//! ```
//! use segue_core::{ManualClock, Node, Request, StandardInterpolator, State};
//!
//! let clock = ManualClock::new();
//! let mut node = Node::new(State::new().with("x", 0.0), StandardInterpolator, clock.clone());
//! node.transition(Request::new().to("x", 1.0)).unwrap();
//!
//! clock.advance(300.0);
//! node.advance().unwrap();
//!
//! for event in node.drain_events() {
//!     println!("{} {:?} on {}", event.transition_id, event.kind, event.state_key);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use super::error::{Result, TransitionError};
use super::node::Entity;
use super::types::TransitionId;

/// A user lifecycle handler, called with the entity that owns the
/// transition.
pub type Handler = Box<dyn FnOnce(&mut dyn Entity)>;

/// Which user handler to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Interrupt,
    End,
}

impl EventKind {
    /// Look up a kind by its request key.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "interrupt" => Some(Self::Interrupt),
            "end" => Some(Self::End),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Interrupt => "interrupt",
            Self::End => "end",
        }
    }
}

/// Handlers as supplied with a request, before validation.
///
/// An entry without a handler stands for a value that is not invocable,
/// which is what every `events` entry of a JSON request is.
#[derive(Default)]
pub struct RawEvents {
    entries: Vec<(String, Option<Handler>)>,
}

impl RawEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler under `name`.
    pub fn insert(&mut self, name: impl Into<String>, handler: Handler) {
        self.entries.push((name.into(), Some(handler)));
    }

    /// Record a non-invocable entry under `name`.
    pub fn insert_invalid(&mut self, name: impl Into<String>) {
        self.entries.push((name.into(), None));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry that is not invocable, if any.
    pub fn invalid_entry(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, handler)| handler.is_none())
            .map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for RawEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(name, h)| (name, h.is_some())))
            .finish()
    }
}

/// Validated handlers of one request.
#[derive(Default)]
pub struct Events {
    start: Option<Handler>,
    interrupt: Option<Handler>,
    end: Option<Handler>,
}

/// Handlers shared by every transition a request spawns.
pub type SharedEvents = Rc<RefCell<Events>>;

impl Events {
    /// Validate raw handlers.
    ///
    /// Fails on the first entry that is not invocable. Unknown event names
    /// are accepted and ignored.
    pub fn wrap(raw: RawEvents) -> Result<Self> {
        if let Some(name) = raw.invalid_entry() {
            return Err(TransitionError::InvalidEventHandler {
                event: name.to_string(),
            });
        }

        let mut events = Self::default();
        for (name, handler) in raw.entries {
            let Some(handler) = handler else { continue };
            match EventKind::from_name(&name) {
                Some(kind) => *events.slot(kind) = Some(handler),
                None => tracing::warn!(event = %name, "ignoring unknown transition event"),
            }
        }
        Ok(events)
    }

    pub fn into_shared(self) -> SharedEvents {
        Rc::new(RefCell::new(self))
    }

    /// Remove the handler for `kind`; later calls return `None`.
    pub fn take(&mut self, kind: EventKind) -> Option<Handler> {
        self.slot(kind).take()
    }

    pub fn has(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Start => self.start.is_some(),
            EventKind::Interrupt => self.interrupt.is_some(),
            EventKind::End => self.end.is_some(),
        }
    }

    fn slot(&mut self, kind: EventKind) -> &mut Option<Handler> {
        match kind {
            EventKind::Start => &mut self.start,
            EventKind::Interrupt => &mut self.interrupt,
            EventKind::End => &mut self.end,
        }
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("start", &self.start.is_some())
            .field("interrupt", &self.interrupt.is_some())
            .field("end", &self.end.is_some())
            .finish()
    }
}

/// What happened to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// Tweens were initialized.
    Started,
    /// Superseded by a newer transition on the same key while running.
    Interrupted,
    /// Final tick applied.
    Ended,
    /// Removed by `stop_transitions`, or superseded before running.
    Cancelled,
}

/// A lifecycle change recorded by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub transition_id: TransitionId,
    pub state_key: String,
    pub kind: LifecycleKind,
}

impl LifecycleEvent {
    pub fn new(transition_id: TransitionId, state_key: impl Into<String>, kind: LifecycleKind) -> Self {
        Self {
            transition_id,
            state_key: state_key.into(),
            kind,
        }
    }
}

/// Queue for collecting lifecycle events between polls.
///
/// A bounded queue drops its oldest event when a push would exceed the limit.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<LifecycleEvent>,
    limit: Option<usize>,
}

impl EventQueue {
    /// Create a new empty event queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue holding at most `limit` events.
    pub fn bounded(limit: usize) -> Self {
        Self {
            events: VecDeque::new(),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn push(&mut self, event: LifecycleEvent) {
        if let Some(limit) = self.limit {
            if limit == 0 {
                return;
            }
            while self.events.len() >= limit {
                self.events.pop_front();
            }
        }
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Pop the next event from the queue.
    pub fn pop(&mut self) -> Option<LifecycleEvent> {
        self.events.pop_front()
    }

    /// Drain all events from the queue, returning an iterator.
    pub fn drain(&mut self) -> impl Iterator<Item = LifecycleEvent> + '_ {
        self.events.drain(..)
    }

    /// Peek at the next event without removing it.
    pub fn peek(&self) -> Option<&LifecycleEvent> {
        self.events.front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Get events for a specific state key.
    pub fn events_for_key(&self, state_key: &str) -> Vec<&LifecycleEvent> {
        self.events
            .iter()
            .filter(|e| e.state_key == state_key)
            .collect()
    }
}

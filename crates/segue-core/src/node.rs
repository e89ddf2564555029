//! Animatable entity and transition scheduler.
//!
//! A `Node` owns a `State` and the live set of transitions animating it.
//! Each top-level key touched by a request becomes one transition, driven
//! through its lifecycle by the node's timer queue:
//!
//! ```text
//! Exists ─queue→ Queued ─start→ Starting → Started ─settle→ Running ─tick*→ Stopping → Stopped
//! ```
//!
//! At most one transition per state key is ever `Running`. When a
//! transition starts it scans the live set for the same key:
//! - another one `Started` in this same frame: retry this start on a
//!   one-shot timer
//! - another one `Running`: stop it and fire its `interrupt` handler
//! - any other older one: stop it silently
//!
//! # Usage
//!
//! ```
//! use segue_core::{ManualClock, Node, Request, StandardInterpolator, State};
//!
//! let clock = ManualClock::new();
//! let mut node = Node::new(State::new().with("x", 0.0), StandardInterpolator, clock.clone());
//!
//! node.transition(Request::new().to("x", 100.0).duration(100.0)).unwrap();
//! node.advance().unwrap();
//!
//! clock.advance(50.0);
//! node.advance().unwrap();
//! assert_eq!(node.state().number("x"), Some(50.0));
//!
//! clock.advance(50.0);
//! node.advance().unwrap();
//! assert_eq!(node.state().number("x"), Some(100.0));
//! assert!(!node.is_transitioning());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::error::{Result, TransitionError};
use super::events::{EventKind, EventQueue, Events, LifecycleEvent, LifecycleKind, SharedEvents};
use super::interpolate::InterpolatorFactory;
use super::request::{Batch, Request};
use super::state::State;
use super::timer::{Clock, TimerHandle, TimerQueue};
use super::timing::{Timing, TimingDefaults};
use super::tween::{self, Tween, TweenFactory};
use super::types::{TransitionId, TransitionStatus};

/// The view of an animatable entity given to lifecycle handlers.
pub trait Entity {
    /// Current state.
    fn state(&self) -> &State;

    /// Overlay `update` onto the state.
    fn set_state(&mut self, update: State);

    /// Submit one or more transition requests.
    fn transition(&mut self, batch: Batch) -> Result<Vec<TransitionId>>;

    /// True while any transition is live.
    fn is_transitioning(&self) -> bool;

    /// Remove every live transition without firing handlers.
    fn stop_transitions(&mut self);
}

/// Timer action: what to do next for a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Queue,
    Start,
    /// Deferred start after a same-frame collision.
    Retry,
    /// Deferred move from `Started` to `Running`, with the start's elapsed time.
    Settle { elapsed: f64 },
    Tick,
    Stop,
}

/// Lifecycle record of one state key within one request.
struct Transition {
    state_key: String,
    timing: Timing,
    timer: TimerHandle,
    factories: Vec<TweenFactory>,
    tweens: Vec<Tween>,
    events: SharedEvents,
    status: TransitionStatus,
}

/// Lifecycle events kept between calls to [`Node::drain_events`].
pub const EVENT_LOG_LIMIT: usize = 1024;

/// An animatable entity.
///
/// `I` supplies interpolators for tweens that need one.
///
/// Lifecycle events are recorded in a bounded log. Owners that never call
/// [`Node::drain_events`] only lose the oldest entries once
/// [`EVENT_LOG_LIMIT`] is reached.
pub struct Node<I> {
    state: State,
    interpolators: I,
    clock: Rc<dyn Clock>,
    defaults: TimingDefaults,
    timers: TimerQueue<(TransitionId, Step)>,
    live: BTreeMap<TransitionId, Transition>,
    event_queue: EventQueue,
    /// Time of the frame being flushed.
    frame: Option<f64>,
}

impl<I: InterpolatorFactory> Node<I> {
    pub fn new(state: State, interpolators: I, clock: impl Clock + 'static) -> Self {
        Self {
            state,
            interpolators,
            clock: Rc::new(clock),
            defaults: TimingDefaults::default(),
            timers: TimerQueue::new(),
            live: BTreeMap::new(),
            event_queue: EventQueue::bounded(EVENT_LOG_LIMIT),
            frame: None,
        }
    }

    /// Keep at most `limit` undrained lifecycle events; `0` disables the log.
    pub fn with_event_limit(mut self, limit: usize) -> Self {
        self.event_queue = EventQueue::bounded(limit);
        self
    }

    /// Replace the timing used when a request does not override it.
    pub fn with_defaults(mut self, defaults: TimingDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &TimingDefaults {
        &self.defaults
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn interpolators(&self) -> &I {
        &self.interpolators
    }

    /// Overlay `update` onto the state (shallow).
    pub fn set_state(&mut self, update: State) {
        self.state.merge(update);
    }

    /// Overlay the update computed from the current state.
    pub fn update_state(&mut self, f: impl FnOnce(&State) -> State) {
        let update = f(&self.state);
        self.state.merge(update);
    }

    /// Current time as seen by the scheduler: the frame time while a frame
    /// is being flushed, the clock otherwise.
    pub fn now(&self) -> f64 {
        self.frame.unwrap_or_else(|| self.clock.now())
    }

    /// Submit one or more requests, processed in order.
    ///
    /// Handlers of every request are validated before anything is applied.
    /// Immediate values are written synchronously; animation begins on the
    /// next [`Node::advance`].
    pub fn transition(&mut self, batch: impl Into<Batch>) -> Result<Vec<TransitionId>> {
        let batch = batch.into();
        if let Some(event) = batch.0.iter().find_map(|r| r.events.invalid_entry()) {
            return Err(TransitionError::InvalidEventHandler {
                event: event.to_string(),
            });
        }

        let mut ids = Vec::new();
        for request in batch {
            ids.extend(self.parse(request)?);
        }
        Ok(ids)
    }

    /// Submit a JSON request object or array of them.
    pub fn transition_json(&mut self, json: &serde_json::Value) -> Result<Vec<TransitionId>> {
        self.transition(Batch::from_json(json)?)
    }

    fn parse(&mut self, request: Request) -> Result<Vec<TransitionId>> {
        let Request {
            targets,
            timing,
            events,
        } = request;

        let events = Events::wrap(events)?.into_shared();
        let timing = self.defaults.resolve(&timing, self.now());
        debug!(
            keys = targets.len(),
            delay = timing.delay,
            duration = timing.duration,
            "parsed transition request"
        );

        let mut ids = Vec::with_capacity(targets.len());
        for (state_key, target) in targets {
            let factories = tween::build(&state_key, target, &mut self.state);
            ids.push(self.register(state_key, timing.clone(), factories, events.clone()));
        }
        Ok(ids)
    }

    fn register(
        &mut self,
        state_key: String,
        timing: Timing,
        factories: Vec<TweenFactory>,
        events: SharedEvents,
    ) -> TransitionId {
        let id = TransitionId::next();
        let timer = self.timers.schedule((id, Step::Queue), 0.0, timing.time);
        trace!(%id, key = %state_key, tweens = factories.len(), "transition registered");
        self.live.insert(
            id,
            Transition {
                state_key,
                timing,
                timer,
                factories,
                tweens: Vec::new(),
                events,
                status: TransitionStatus::Exists,
            },
        );
        id
    }

    /// Flush due timers at the clock's current time.
    pub fn advance(&mut self) -> Result<()> {
        let now = self.clock.now();
        self.advance_to(now)
    }

    /// Flush due timers at `now`.
    ///
    /// Errors from materializing tweens abort the flush and propagate.
    pub fn advance_to(&mut self, now: f64) -> Result<()> {
        let outer = self.frame.replace(now);
        let result = self.flush(now);
        self.frame = outer;
        if outer.is_none() {
            self.timers.compact();
        }
        result
    }

    fn flush(&mut self, now: f64) -> Result<()> {
        let mut i = 0;
        while i < self.timers.len() {
            if let Some(((id, step), elapsed)) = self.timers.fire(i, now) {
                self.run(id, step, elapsed)?;
            }
            i += 1;
        }
        Ok(())
    }

    fn run(&mut self, id: TransitionId, step: Step, elapsed: f64) -> Result<()> {
        match step {
            Step::Queue => self.queue(id, elapsed),
            Step::Start | Step::Retry => self.start(id, elapsed),
            Step::Settle { elapsed } => {
                self.settle(id, elapsed);
                Ok(())
            }
            Step::Tick => {
                self.tick(id, elapsed);
                Ok(())
            }
            Step::Stop => {
                self.stop(id);
                Ok(())
            }
        }
    }

    fn queue(&mut self, id: TransitionId, elapsed: f64) -> Result<()> {
        let Some(tr) = self.live.get_mut(&id) else {
            return Ok(());
        };
        tr.status = TransitionStatus::Queued;
        let (delay, time) = (tr.timing.delay, tr.timing.time);
        self.timers.restart(tr.timer, (id, Step::Start), delay, time);
        trace!(%id, delay, "transition queued");

        if delay <= elapsed {
            self.start(id, elapsed - delay)?;
        }
        Ok(())
    }

    fn start(&mut self, id: TransitionId, elapsed: f64) -> Result<()> {
        let Some(tr) = self.live.get(&id) else {
            return Ok(());
        };
        if tr.status != TransitionStatus::Queued {
            self.stop(id);
            return Ok(());
        }

        let state_key = tr.state_key.clone();
        let others: Vec<TransitionId> = self.live.keys().copied().filter(|o| *o != id).collect();
        for other in others {
            let Some(o) = self.live.get(&other) else {
                continue;
            };
            if o.state_key != state_key {
                continue;
            }
            match o.status {
                TransitionStatus::Started => {
                    let now = self.now();
                    self.timers.timeout((id, Step::Retry), 0.0, now);
                    trace!(%id, blocker = %other, "start deferred");
                    return Ok(());
                }
                TransitionStatus::Running => self.interrupt(other),
                _ if other < id => self.cancel(other),
                _ => {}
            }
        }

        // An interrupt handler may have stopped everything.
        if !self.live.contains_key(&id) {
            return Ok(());
        }

        let now = self.now();
        self.timers.timeout((id, Step::Settle { elapsed }), 0.0, now);

        let Some(events) = self.set_status(id, TransitionStatus::Starting) else {
            return Ok(());
        };
        self.fire(&events, EventKind::Start);

        let Some(tr) = self.live.get_mut(&id) else {
            return Ok(());
        };
        if tr.status != TransitionStatus::Starting {
            return Ok(());
        }
        tr.status = TransitionStatus::Started;
        let factories = std::mem::take(&mut tr.factories);

        let mut tweens = Vec::with_capacity(factories.len());
        for factory in &factories {
            if let Some(tween) = factory.materialize(&self.state, &self.interpolators)? {
                tweens.push(tween);
            }
        }

        trace!(%id, key = %state_key, tweens = tweens.len(), "transition started");
        if let Some(tr) = self.live.get_mut(&id) {
            tr.tweens = tweens;
        }
        self.event_queue
            .push(LifecycleEvent::new(id, state_key, LifecycleKind::Started));
        Ok(())
    }

    fn settle(&mut self, id: TransitionId, elapsed: f64) {
        let Some(tr) = self.live.get_mut(&id) else {
            return;
        };
        if tr.status != TransitionStatus::Started {
            return;
        }
        tr.status = TransitionStatus::Running;
        let (delay, time) = (tr.timing.delay, tr.timing.time);
        self.timers.restart(tr.timer, (id, Step::Tick), delay, time);
        trace!(%id, "transition running");
        self.tick(id, elapsed);
    }

    fn tick(&mut self, id: TransitionId, elapsed: f64) {
        let now = self.now();
        let Some(tr) = self.live.get_mut(&id) else {
            return;
        };

        let t = if elapsed < tr.timing.duration {
            tr.timing.progress(elapsed)
        } else {
            self.timers.restart(tr.timer, (id, Step::Stop), 0.0, now);
            tr.status = TransitionStatus::Stopping;
            1.0
        };

        for tween in &tr.tweens {
            tween.apply(&mut self.state, t);
        }

        if tr.status != TransitionStatus::Stopping {
            return;
        }

        let events = tr.events.clone();
        trace!(%id, key = %tr.state_key, "transition ended");
        self.event_queue.push(LifecycleEvent::new(
            id,
            tr.state_key.clone(),
            LifecycleKind::Ended,
        ));
        self.fire(&events, EventKind::End);
        self.stop(id);
    }

    fn stop(&mut self, id: TransitionId) {
        let Some(mut tr) = self.live.remove(&id) else {
            return;
        };
        tr.status = TransitionStatus::Stopped;
        self.timers.stop(tr.timer);
        trace!(%id, live = self.live.len(), "transition stopped");
    }

    /// Stop a running transition superseded by a newer one.
    fn interrupt(&mut self, id: TransitionId) {
        let Some(mut tr) = self.live.remove(&id) else {
            return;
        };
        tr.status = TransitionStatus::Stopped;
        self.timers.stop(tr.timer);
        trace!(%id, key = %tr.state_key, "transition interrupted");
        self.event_queue.push(LifecycleEvent::new(
            id,
            tr.state_key,
            LifecycleKind::Interrupted,
        ));
        self.fire(&tr.events, EventKind::Interrupt);
    }

    /// Stop a transition that never reached `Running`.
    fn cancel(&mut self, id: TransitionId) {
        let Some(mut tr) = self.live.remove(&id) else {
            return;
        };
        let ending = tr.status == TransitionStatus::Stopping;
        tr.status = TransitionStatus::Stopped;
        self.timers.stop(tr.timer);
        trace!(%id, key = %tr.state_key, "transition cancelled");
        // A transition superseded from its own `end` handler already ended.
        if !ending {
            self.event_queue.push(LifecycleEvent::new(
                id,
                tr.state_key,
                LifecycleKind::Cancelled,
            ));
        }
    }

    /// Set the status of a live transition, returning its handlers.
    fn set_status(&mut self, id: TransitionId, status: TransitionStatus) -> Option<SharedEvents> {
        let tr = self.live.get_mut(&id)?;
        tr.status = status;
        Some(tr.events.clone())
    }

    fn fire(&mut self, events: &SharedEvents, kind: EventKind) {
        let handler = events.borrow_mut().take(kind);
        if let Some(handler) = handler {
            trace!(event = kind.name(), "firing handler");
            handler(self as &mut dyn Entity);
        }
    }

    /// True while any transition is live.
    pub fn is_transitioning(&self) -> bool {
        !self.live.is_empty()
    }

    /// Number of live transitions.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Status of a live transition; `None` once it has stopped.
    pub fn transition_status(&self, id: TransitionId) -> Option<TransitionStatus> {
        self.live.get(&id).map(|tr| tr.status)
    }

    /// Hard-cancel every live transition.
    ///
    /// No handlers fire; the state keeps whatever was last written.
    pub fn stop_transitions(&mut self) {
        let live = std::mem::take(&mut self.live);
        if !live.is_empty() {
            debug!(count = live.len(), "stopping all transitions");
        }
        for (id, tr) in live {
            self.timers.stop(tr.timer);
            self.event_queue
                .push(LifecycleEvent::new(id, tr.state_key, LifecycleKind::Cancelled));
        }
    }

    /// Drain recorded lifecycle events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = LifecycleEvent> + '_ {
        self.event_queue.drain()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Earliest time at which a timer is due, if any.
    pub fn next_due(&self) -> Option<f64> {
        self.timers.next_due()
    }
}

impl<I: InterpolatorFactory> Entity for Node<I> {
    fn state(&self) -> &State {
        Node::state(self)
    }

    fn set_state(&mut self, update: State) {
        Node::set_state(self, update);
    }

    fn transition(&mut self, batch: Batch) -> Result<Vec<TransitionId>> {
        Node::transition(self, batch)
    }

    fn is_transitioning(&self) -> bool {
        Node::is_transitioning(self)
    }

    fn stop_transitions(&mut self) {
        Node::stop_transitions(self);
    }
}

impl<I> fmt::Debug for Node<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("state", &self.state)
            .field("live", &self.live.len())
            .field("frame", &self.frame)
            .finish()
    }
}

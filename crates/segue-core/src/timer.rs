//! Frame clock and timer queue.
//!
//! The queue holds plain-data actions rather than callbacks; the owner walks
//! it with [`TimerQueue::fire`] and dispatches each due action itself, which
//! lets actions re-enter the owner and schedule more timers mid-flush.
//!
//! A timer fires with `elapsed = now - (time + delay)` whenever that is
//! non-negative. Timers appended while a flush is in progress are visited by
//! the same flush if they are already due; restarting a timer keeps its place
//! in the queue.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// Source of the current time, in milliseconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Virtual clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Move the clock forward by `dt`.
    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Monotonic wall clock measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Debug)]
struct Timer<A> {
    handle: TimerHandle,
    /// `None` once stopped.
    action: Option<A>,
    due: f64,
    once: bool,
}

/// Ordered queue of timers carrying actions of type `A`.
#[derive(Debug)]
pub struct TimerQueue<A> {
    timers: Vec<Timer<A>>,
    next_handle: u64,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_handle: 1,
        }
    }
}

impl<A: Clone> TimerQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a repeating timer that fires from `time + delay` onwards.
    pub fn schedule(&mut self, action: A, delay: f64, time: f64) -> TimerHandle {
        self.push(action, delay, time, false)
    }

    /// Schedule a timer that fires once at `time + delay`, then stops.
    pub fn timeout(&mut self, action: A, delay: f64, time: f64) -> TimerHandle {
        self.push(action, delay, time, true)
    }

    fn push(&mut self, action: A, delay: f64, time: f64, once: bool) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.push(Timer {
            handle,
            action: Some(action),
            due: time + delay,
            once,
        });
        handle
    }

    /// Replace the action and due time of `handle`.
    ///
    /// A timer still in the queue keeps its position; one already removed is
    /// appended again.
    pub fn restart(&mut self, handle: TimerHandle, action: A, delay: f64, time: f64) {
        let due = time + delay;
        match self.timers.iter_mut().find(|t| t.handle == handle) {
            Some(timer) => {
                timer.action = Some(action);
                timer.due = due;
            }
            None => self.timers.push(Timer {
                handle,
                action: Some(action),
                due,
                once: false,
            }),
        }
    }

    /// Stop `handle`. Stopping twice is harmless.
    pub fn stop(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.timers.iter_mut().find(|t| t.handle == handle) {
            timer.action = None;
            timer.due = f64::INFINITY;
        }
    }

    /// Action and elapsed time of the timer at `index`, if it is due at
    /// `now`. One-shot timers stop as they fire.
    pub fn fire(&mut self, index: usize, now: f64) -> Option<(A, f64)> {
        let timer = self.timers.get_mut(index)?;
        let elapsed = now - timer.due;
        if elapsed < 0.0 {
            return None;
        }
        let action = if timer.once {
            timer.due = f64::INFINITY;
            timer.action.take()?
        } else {
            timer.action.clone()?
        };
        Some((action, elapsed))
    }

    /// Drop stopped timers. Call between flushes only.
    pub fn compact(&mut self) {
        self.timers.retain(|t| t.action.is_some());
    }

    /// Queue length, stopped timers included.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of timers that can still fire.
    pub fn active(&self) -> usize {
        self.timers.iter().filter(|t| t.action.is_some()).count()
    }

    /// Earliest due time among active timers.
    pub fn next_due(&self) -> Option<f64> {
        self.timers
            .iter()
            .filter(|t| t.action.is_some())
            .map(|t| t.due)
            .reduce(f64::min)
    }
}

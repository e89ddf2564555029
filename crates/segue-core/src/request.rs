//! Transition requests.
//!
//! A `Request` names the state keys to change and how each one moves:
//!
//! | Motion            | Effect                                                  |
//! |-------------------|---------------------------------------------------------|
//! | `Set(end)`        | written immediately, no animation                       |
//! | `To(end)`         | animated from the value current when the tween starts   |
//! | `FromTo(b, end)`  | `b` written immediately, then animated to `end`         |
//! | `Custom(f)`       | `f(t)` written every frame, no interpolator involved    |
//!
//! A key may instead hold a namespace: a list of attribute motions written
//! under that key without disturbing sibling attributes.
//!
//! Requests are built with the builder methods or parsed from JSON, where
//! a literal is `Set`, `[end]` is `To` and `[begin, end]` is `FromTo`.

use std::fmt;
use std::rc::Rc;

use super::easing::Easing;
use super::error::{Result, TransitionError};
use super::events::{Handler, RawEvents};
use super::node::Entity;
use super::timing::TimingOverrides;
use super::types::Value;

/// Per-frame value function for custom tweens.
pub type CustomTween = Rc<dyn Fn(f64) -> Value>;

/// How a single attribute moves.
#[derive(Clone)]
pub enum Motion {
    Set(Value),
    To(Value),
    FromTo(Value, Value),
    Custom(CustomTween),
}

impl Motion {
    pub fn set(end: impl Into<Value>) -> Self {
        Self::Set(end.into())
    }

    pub fn to(end: impl Into<Value>) -> Self {
        Self::To(end.into())
    }

    pub fn from_to(begin: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self::FromTo(begin.into(), end.into())
    }

    pub fn custom(f: impl Fn(f64) -> Value + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Parse the JSON shape of an attribute value.
    fn from_json(key: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Array(items) => match items.as_slice() {
                [end] => Ok(Self::To(json_value(key, end)?)),
                [begin, end] => Ok(Self::FromTo(json_value(key, begin)?, json_value(key, end)?)),
                _ => Err(TransitionError::malformed(
                    key,
                    format!("expected [end] or [begin, end], got {} elements", items.len()),
                )),
            },
            other => Ok(Self::Set(json_value(key, other)?)),
        }
    }
}

impl fmt::Debug for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set(v) => f.debug_tuple("Set").field(v).finish(),
            Self::To(v) => f.debug_tuple("To").field(v).finish(),
            Self::FromTo(a, b) => f.debug_tuple("FromTo").field(a).field(b).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn json_value(key: &str, value: &serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| TransitionError::malformed(key, "number out of range")),
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        serde_json::Value::Object(_) => Err(TransitionError::malformed(
            key,
            "namespaces cannot be nested",
        )),
        other => Err(TransitionError::malformed(
            key,
            format!("unsupported value `{other}`"),
        )),
    }
}

/// What a request does to one top-level state key.
#[derive(Debug, Clone)]
pub enum Target {
    Value(Motion),
    Namespace(Vec<(String, Motion)>),
}

/// One transition request.
#[derive(Debug, Default)]
pub struct Request {
    pub(crate) targets: Vec<(String, Target)>,
    pub(crate) timing: TimingOverrides,
    pub(crate) events: RawEvents,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `end` under `key` immediately.
    pub fn set(self, key: impl Into<String>, end: impl Into<Value>) -> Self {
        self.motion(key, Motion::set(end))
    }

    /// Animate `key` from its current value to `end`.
    pub fn to(self, key: impl Into<String>, end: impl Into<Value>) -> Self {
        self.motion(key, Motion::to(end))
    }

    /// Write `begin` under `key` immediately, then animate to `end`.
    pub fn from_to(
        self,
        key: impl Into<String>,
        begin: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.motion(key, Motion::from_to(begin, end))
    }

    /// Drive `key` with a custom per-frame function.
    pub fn custom(self, key: impl Into<String>, f: impl Fn(f64) -> Value + 'static) -> Self {
        self.motion(key, Motion::custom(f))
    }

    pub fn motion(self, key: impl Into<String>, motion: Motion) -> Self {
        self.target(key, Target::Value(motion))
    }

    /// Move attributes of the namespace under `key`.
    pub fn namespace<K, I>(self, key: impl Into<String>, attrs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Motion)>,
    {
        let attrs = attrs.into_iter().map(|(k, m)| (k.into(), m)).collect();
        self.target(key, Target::Namespace(attrs))
    }

    /// Set the target of `key`, replacing an earlier one in place.
    pub fn target(mut self, key: impl Into<String>, target: Target) -> Self {
        let key = key.into();
        match self.targets.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = target,
            None => self.targets.push((key, target)),
        }
        self
    }

    pub fn delay(mut self, delay: f64) -> Self {
        self.timing.delay = Some(delay);
        self
    }

    pub fn duration(mut self, duration: f64) -> Self {
        self.timing.duration = Some(duration);
        self
    }

    pub fn ease(mut self, ease: impl Into<Easing>) -> Self {
        self.timing.ease = Some(ease.into());
        self
    }

    pub fn timing(mut self, timing: TimingOverrides) -> Self {
        self.timing = timing;
        self
    }

    pub fn on_start(self, f: impl FnOnce(&mut dyn Entity) + 'static) -> Self {
        self.on("start", Box::new(f))
    }

    pub fn on_interrupt(self, f: impl FnOnce(&mut dyn Entity) + 'static) -> Self {
        self.on("interrupt", Box::new(f))
    }

    pub fn on_end(self, f: impl FnOnce(&mut dyn Entity) + 'static) -> Self {
        self.on("end", Box::new(f))
    }

    /// Attach a handler under an arbitrary event name.
    pub fn on(mut self, event: impl Into<String>, handler: Handler) -> Self {
        self.events.insert(event, handler);
        self
    }

    /// State keys touched, in request order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Parse a JSON request object.
    ///
    /// `timing` and `events` are control keys. JSON cannot carry functions,
    /// so any `events` entry is recorded as a non-invocable handler and the
    /// request is rejected when it is submitted.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(TransitionError::malformed("", "request must be an object"));
        };

        let mut request = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "timing" => request.timing = TimingOverrides::from_json(value)?,
                "events" => {
                    let serde_json::Value::Object(events) = value else {
                        return Err(TransitionError::malformed(key, "events must be an object"));
                    };
                    for name in events.keys() {
                        request.events.insert_invalid(name.clone());
                    }
                }
                _ => {
                    let target = match value {
                        serde_json::Value::Object(attrs) => Target::Namespace(
                            attrs
                                .iter()
                                .map(|(attr, v)| Ok((attr.clone(), Motion::from_json(attr, v)?)))
                                .collect::<Result<_>>()?,
                        ),
                        other => Target::Value(Motion::from_json(key, other)?),
                    };
                    request = request.target(key.clone(), target);
                }
            }
        }

        Ok(request)
    }
}

/// One or more requests submitted together, processed in order.
#[derive(Debug, Default)]
pub struct Batch(pub Vec<Request>);

impl Batch {
    /// Parse a JSON request object or an array of them.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Array(items) => Ok(Self(
                items.iter().map(Request::from_json).collect::<Result<_>>()?,
            )),
            other => Ok(Self(vec![Request::from_json(other)?])),
        }
    }
}

impl From<Request> for Batch {
    fn from(request: Request) -> Self {
        Self(vec![request])
    }
}

impl From<Vec<Request>> for Batch {
    fn from(requests: Vec<Request>) -> Self {
        Self(requests)
    }
}

impl IntoIterator for Batch {
    type Item = Request;
    type IntoIter = std::vec::IntoIter<Request>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

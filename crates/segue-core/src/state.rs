//! The state store mutated by transitions.
//!
//! State is a map from key to either a primitive `Value` or a one-level
//! namespace of attributes. All writes are overlay merges: keys absent from
//! an update survive. Top-level merges are shallow, so merging a namespace
//! entry replaces that namespace; attribute writes (`merge_attr`) keep the
//! sibling attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::Value;

/// Attributes grouped under a single state key.
pub type Namespace = BTreeMap<String, Value>;

/// One top-level state entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// A primitive value.
    Value(Value),
    /// A namespace of primitive attributes.
    Namespace(Namespace),
}

impl Entry {
    /// Try to view the entry as a primitive.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Namespace(_) => None,
        }
    }

    /// Try to view the entry as a namespace.
    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Self::Namespace(ns) => Some(ns),
            Self::Value(_) => None,
        }
    }
}

impl From<Value> for Entry {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Namespace> for Entry {
    fn from(ns: Namespace) -> Self {
        Self::Namespace(ns)
    }
}

/// The nested key/value state owned by an animatable entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    entries: BTreeMap<String, Entry>,
}

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a primitive.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), Entry::Value(value.into()));
        self
    }

    /// Builder-style insert of a namespace.
    pub fn with_namespace<K, V, I>(mut self, key: impl Into<String>, attrs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let ns = attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.entries.insert(key.into(), Entry::Namespace(ns));
        self
    }

    /// Get the entry stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Get the primitive stored under `key`.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(Entry::as_value)
    }

    /// Get the number stored under `key`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(Value::as_f64)
    }

    /// Get the namespace stored under `key`.
    pub fn namespace(&self, key: &str) -> Option<&Namespace> {
        self.entries.get(key).and_then(Entry::as_namespace)
    }

    /// Get attribute `attr` of namespace `ns`.
    pub fn attr(&self, ns: &str, attr: &str) -> Option<&Value> {
        self.namespace(ns).and_then(|n| n.get(attr))
    }

    /// Read a tween target: a top-level value when `ns` is `None`, else a
    /// namespaced attribute.
    pub fn lookup(&self, attr: &str, ns: Option<&str>) -> Option<&Value> {
        match ns {
            Some(ns) => self.attr(ns, attr),
            None => self.value(attr),
        }
    }

    /// Overlay `update` onto this state (shallow).
    pub fn merge(&mut self, update: State) {
        self.entries.extend(update.entries);
    }

    /// Write a primitive under `key`.
    pub fn merge_value(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), Entry::Value(value));
    }

    /// Write attribute `attr` of namespace `ns`, keeping sibling attributes.
    ///
    /// A primitive previously stored under `ns` is replaced by a namespace.
    pub fn merge_attr(&mut self, ns: &str, attr: &str, value: Value) {
        let entry = self
            .entries
            .entry(ns.to_string())
            .or_insert_with(|| Entry::Namespace(Namespace::new()));
        match entry {
            Entry::Namespace(attrs) => {
                attrs.insert(attr.to_string(), value);
            }
            Entry::Value(_) => {
                let mut attrs = Namespace::new();
                attrs.insert(attr.to_string(), value);
                *entry = Entry::Namespace(attrs);
            }
        }
    }

    /// Write a tween target: see [`State::lookup`].
    pub fn write(&mut self, attr: &str, ns: Option<&str>, value: Value) {
        match ns {
            Some(ns) => self.merge_attr(ns, attr, value),
            None => self.merge_value(attr, value),
        }
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the state holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Entry)> for State {
    fn from_iter<T: IntoIterator<Item = (K, Entry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

static_assertions::assert_impl_all!(State: Send, Sync);

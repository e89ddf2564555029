//! Error types for the transition engine.

use thiserror::Error;

/// Result type for transition operations.
pub type Result<T> = std::result::Result<T, TransitionError>;

/// Errors raised while parsing transition requests or driving transitions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// A lifecycle event entry was supplied with a value that cannot be invoked.
    #[error("event handler `{event}` must be a function")]
    InvalidEventHandler { event: String },

    /// The entity's interpolator capability could not produce an interpolator.
    #[error("no interpolator available for `{}`", qualified(.attribute, .namespace))]
    MissingInterpolator {
        attribute: String,
        namespace: Option<String>,
    },

    /// A request value has a shape the engine does not understand.
    #[error("malformed request at `{key}`: {reason}")]
    MalformedRequest { key: String, reason: String },

    /// Timing overrides could not be read.
    #[error("invalid timing: {0}")]
    InvalidTiming(String),
}

fn qualified(attribute: &str, namespace: &Option<String>) -> String {
    match namespace {
        Some(ns) => format!("{ns}.{attribute}"),
        None => attribute.to_string(),
    }
}

impl TransitionError {
    pub(crate) fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

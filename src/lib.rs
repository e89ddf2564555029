//! Segue: value transitions for nested state.
//!
//! Re-exports the engine (`segue::engine`) and its configuration layer
//! (`segue::config`).

pub use segue_config as config;
pub use segue_core as engine;

pub use segue_core::{Batch, Entity, Motion, Node, Request, State, Value};

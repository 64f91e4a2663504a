//! Snapshot of global state, as a map or as JSON text.

use serde_json::{Map, Value};

/// Produces the current global state.
pub trait GlobalStateSource: Send + Sync {
    fn global_state(&self) -> Map<String, Value>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlobalState {
    Serialized(String),
    Map(Map<String, Value>),
}

/// Takes a snapshot; serialized to JSON text when `serialize` is set.
pub fn output_global_state(
    source: &dyn GlobalStateSource,
    serialize: bool,
) -> Result<GlobalState, serde_json::Error> {
    let state = source.global_state();
    if serialize {
        Ok(GlobalState::Serialized(serde_json::to_string(&state)?))
    } else {
        Ok(GlobalState::Map(state))
    }
}

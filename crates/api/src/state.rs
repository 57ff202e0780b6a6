//! Application state shared across handlers.

use safety_core::Engine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Relationship, ping and check-in engine.
    pub engine: Engine,
}

impl AppState {
    /// Create new application state.
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}

/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Cheap to clone: the gate sits behind an Arc and holds configuration only
 */
use std::sync::Arc;

use crate::services::authz::AuthorizerGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<AuthorizerGate>,
}

impl AppState {
    pub fn new(gate: Arc<AuthorizerGate>) -> Self {
        Self { gate }
    }
}

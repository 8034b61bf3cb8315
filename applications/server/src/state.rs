/// Shared application state
use crate::services::AuthService;
use nest_engine::MutationEngine;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MutationEngine>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(engine: Arc<MutationEngine>, auth_service: Arc<AuthService>) -> Self {
        Self {
            engine,
            auth_service,
        }
    }
}

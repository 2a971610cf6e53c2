//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::DocumentStore;
use crate::services::{LeagueService, TriggerMode};

/// Shared application state passed to all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// League operations over the shared document store
    pub league: LeagueService,
}

impl AppState {
    /// Create the application state over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, mode: TriggerMode) -> Self {
        Self {
            league: LeagueService::new(store, mode),
        }
    }
}

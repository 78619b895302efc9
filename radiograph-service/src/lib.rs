pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use services::{AnalysisClient, SessionRegistry};

/// Shared application state: the analysis client handle (read-only, shared
/// by every session) and the per-session state registry.
#[derive(Clone)]
pub struct AppState {
    pub analysis_client: AnalysisClient,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(analysis_client: AnalysisClient, sessions: SessionRegistry) -> Self {
        Self {
            analysis_client,
            sessions,
        }
    }
}

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::services::{PreferenceTracker, RecommendationEngine, ScoringEngine};

/// Shared application state
///
/// The engines are constructed exactly once, here, and handed to every
/// handler through the router — there is no lazily initialized global.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<RecommendationEngine>,
    pub scorer: Arc<ScoringEngine>,
    pub tracker: Arc<PreferenceTracker>,
}

impl AppState {
    /// Builds the state over an already-connected pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            recommender: Arc::new(RecommendationEngine::new(pool.clone())),
            scorer: Arc::new(ScoringEngine::new(pool.clone())),
            tracker: Arc::new(PreferenceTracker::new(pool)),
        }
    }
}

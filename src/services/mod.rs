pub mod insights;
pub mod recommendations;
pub mod scoring;
pub mod similarity;

pub use insights::PreferenceTracker;
pub use recommendations::RecommendationEngine;
pub use scoring::ScoringEngine;

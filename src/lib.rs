//! Artisan Algo - intelligent matching service for the craft marketplace
//!
//! This library implements the matching pipeline that turns a free-text
//! buyer query into a ranked list of artisan profiles: deterministic
//! profession classification with an AI fallback, cached query analysis,
//! exact-match candidate retrieval with a strict widened fallback,
//! blended scoring, and decision analytics.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{HeuristicMatcher, MatchOutcome, MatchPipeline, PipelineError, ScoringEngine};
pub use models::{
    CandidateProfile, FindArtisansRequest, FindArtisansResponse, MatchQuery, ProfessionMatch,
    RankedMatch,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let result = HeuristicMatcher::new().detect("a hand thrown pottery mug");
        assert_eq!(result.profession, "pottery");
    }
}

// Core matching logic exports
pub mod keywords;
pub mod matcher;
pub mod pipeline;
pub mod scoring;

pub use matcher::{normalize_profession, normalize_query, HeuristicMatcher};
pub use pipeline::{MatchOutcome, MatchPipeline, PipelineError};
pub use scoring::{performance_score, ScoringEngine};

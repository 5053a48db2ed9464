// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AggregateMetrics, Alert, AlertComparison, AlertMetric, AlertRule, AlertSeverity,
    CandidateProfile, ConfidenceLevel, DecisionRecord, MatchExplanation, MatchQuery, MatchSource,
    PerformanceMetrics, ProfessionMatch, QueryPattern, RankedMatch, SearchMethod, SortPreference,
    UserInteraction,
};
pub use requests::{AlertRuleRequest, FindArtisansRequest, RecordInteractionRequest};
pub use responses::{
    ErrorResponse, FindArtisansResponse, HealthResponse, MatchData, QueryAnalysis, SystemHealth,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a profession classification was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSource {
    Heuristic,
    AiFallback,
    Cache,
}

/// Result of classifying a buyer query into a craft profession
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionMatch {
    pub profession: String,
    pub confidence: f64,
    #[serde(rename = "matchedKeywords")]
    pub matched_keywords: Vec<String>,
    pub source: MatchSource,
}

impl ProfessionMatch {
    /// The "no classification" result: empty profession, zero confidence
    pub fn unmatched() -> Self {
        Self {
            profession: String::new(),
            confidence: 0.0,
            matched_keywords: vec![],
            source: MatchSource::Heuristic,
        }
    }

    /// True when no profession could be resolved
    pub fn is_unmatched(&self) -> bool {
        self.confidence <= 0.0 || self.profession.is_empty()
    }
}

/// Historical performance metrics for a producer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Average customer rating, 0-5
    #[serde(rename = "customerSatisfaction")]
    pub customer_satisfaction: f64,
    /// Fraction of accepted orders completed, 0-1
    #[serde(rename = "completionRate")]
    pub completion_rate: f64,
    #[serde(rename = "totalOrders")]
    pub total_orders: u32,
}

/// A craft producer profile read from the external store
///
/// Owned by the store and treated as read-only for the duration of a
/// request. Display attributes pass through to the response unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    pub name: String,
    pub profession: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "performanceMetrics", default)]
    pub performance: Option<PerformanceMetrics>,
}

/// Sort order requested by the buyer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortPreference {
    #[default]
    Relevance,
    Performance,
}

/// Immutable matching request input
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub raw_text: String,
    pub max_results: usize,
    pub sort_by: SortPreference,
    pub timestamp: DateTime<Utc>,
}

/// How certain the pipeline is about the resolved profession
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
}

/// Why a candidate was ranked where it was
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchExplanation {
    #[serde(rename = "primaryReason")]
    pub primary_reason: String,
    #[serde(rename = "detailedReasons")]
    pub detailed_reasons: Vec<String>,
    #[serde(rename = "matchedKeywords")]
    pub matched_keywords: Vec<String>,
    #[serde(rename = "confidenceLevel")]
    pub confidence_level: ConfidenceLevel,
}

/// One scored and ranked candidate in a match response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMatch {
    pub candidate: CandidateProfile,
    #[serde(rename = "relevanceScore")]
    pub relevance_score: f64,
    /// 1-based, assigned after the stable sort
    pub rank: usize,
    pub explanation: MatchExplanation,
}

/// Which retrieval path produced the candidate set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Exact,
    Widened,
}

/// Post-hoc buyer interaction appended to a decision record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInteraction {
    #[serde(rename = "clickedCandidateId", default)]
    pub clicked_candidate_id: Option<String>,
    #[serde(default)]
    pub converted: bool,
    #[serde(rename = "recordedAt")]
    pub recorded_at: DateTime<Utc>,
}

/// Audit record of one completed matching request
///
/// Append-only; owned by the analytics component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: Uuid,
    #[serde(rename = "queryText")]
    pub query_text: String,
    #[serde(rename = "resolvedProfession")]
    pub resolved_profession: String,
    pub confidence: f64,
    pub source: MatchSource,
    #[serde(rename = "searchMethod")]
    pub search_method: SearchMethod,
    #[serde(rename = "resultCount")]
    pub result_count: usize,
    #[serde(rename = "processingTimeMs")]
    pub processing_time_ms: u64,
    #[serde(rename = "cacheHit")]
    pub cache_hit: bool,
    #[serde(rename = "fallbackUsed")]
    pub fallback_used: bool,
    #[serde(rename = "classificationDegraded")]
    pub classification_degraded: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userInteraction", default)]
    pub user_interaction: Option<UserInteraction>,
}

/// Aggregate metric an alert rule can watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertMetric {
    AvgConfidence,
    AvgProcessingTimeMs,
    CacheHitRate,
    ZeroResultRate,
    FallbackRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertComparison {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Operator-defined threshold on rolling aggregates
///
/// Mutated only through the administrative API, never by request processing.
/// Firing appends an [`Alert`] and stamps `last_triggered`; the rule is
/// otherwise unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub name: String,
    pub metric: AlertMetric,
    pub comparison: AlertComparison,
    pub threshold: f64,
    #[serde(rename = "timeWindowSecs")]
    pub time_window_secs: u64,
    pub severity: AlertSeverity,
    pub enabled: bool,
    #[serde(rename = "cooldownSecs")]
    pub cooldown_secs: u64,
    #[serde(rename = "lastTriggered", default)]
    pub last_triggered: Option<DateTime<Utc>>,
}

/// A fired alert; acknowledged and resolved independently of its rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "ruleId")]
    pub rule_id: Uuid,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(rename = "metricValue")]
    pub metric_value: f64,
    #[serde(rename = "triggeredAt")]
    pub triggered_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub resolved: bool,
}

/// Rolling aggregates over all recorded decisions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateMetrics {
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    #[serde(rename = "avgConfidence")]
    pub avg_confidence: f64,
    #[serde(rename = "avgProcessingTimeMs")]
    pub avg_processing_time_ms: f64,
    #[serde(rename = "cacheHitRate")]
    pub cache_hit_rate: f64,
    #[serde(rename = "zeroResultRate")]
    pub zero_result_rate: f64,
    #[serde(rename = "fallbackRate")]
    pub fallback_rate: f64,
    #[serde(rename = "droppedRecords")]
    pub dropped_records: u64,
}

/// Per-profession request summary over a time window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPattern {
    pub profession: String,
    pub requests: u64,
    #[serde(rename = "avgConfidence")]
    pub avg_confidence: f64,
    #[serde(rename = "zeroResults")]
    pub zero_results: u64,
}

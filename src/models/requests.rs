use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{AlertComparison, AlertMetric, AlertSeverity, SortPreference};

/// Request to find matching artisans for a free-text buyer query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindArtisansRequest {
    #[validate(length(min = 1))]
    pub query: String,
    #[serde(default = "default_max_results")]
    #[serde(alias = "max_results", rename = "maxResults")]
    pub max_results: u16,
    #[serde(default)]
    #[serde(alias = "sort_by", rename = "sortBy")]
    pub sort_by: SortPreference,
}

fn default_max_results() -> u16 {
    20
}

/// Create or update an alert rule
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AlertRuleRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub metric: AlertMetric,
    pub comparison: AlertComparison,
    pub threshold: f64,
    #[serde(rename = "timeWindowSecs", default = "default_time_window_secs")]
    pub time_window_secs: u64,
    pub severity: AlertSeverity,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(rename = "cooldownSecs", default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

fn default_time_window_secs() -> u64 {
    300
}

fn default_cooldown_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

/// Append a click-through / conversion outcome to a logged decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordInteractionRequest {
    #[serde(rename = "clickedCandidateId", default)]
    pub clicked_candidate_id: Option<String>,
    #[serde(default)]
    pub converted: bool,
}

use serde::{Deserialize, Serialize};

use crate::models::domain::RankedMatch;

/// Classification metadata echoed back with a match response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    #[serde(rename = "detectedProfession")]
    pub detected_profession: String,
    #[serde(rename = "extractedKeywords")]
    pub extracted_keywords: Vec<String>,
    pub confidence: f64,
}

/// Health flags describing how this response was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    #[serde(rename = "aiServiceHealthy")]
    pub ai_service_healthy: bool,
    #[serde(rename = "fallbackUsed")]
    pub fallback_used: bool,
    #[serde(rename = "cacheHit")]
    pub cache_hit: bool,
}

/// Payload of a successful match response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchData {
    pub matches: Vec<RankedMatch>,
    #[serde(rename = "totalFound")]
    pub total_found: usize,
    #[serde(rename = "processingTimeMs")]
    pub processing_time_ms: u64,
    #[serde(rename = "queryAnalysis")]
    pub query_analysis: QueryAnalysis,
    #[serde(rename = "systemHealth")]
    pub system_health: SystemHealth,
}

/// Success envelope for the find endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindArtisansResponse {
    pub success: bool,
    pub data: MatchData,
}

impl FindArtisansResponse {
    pub fn new(data: MatchData) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Machine-readable error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suggestion: Option<String>,
}

/// Failure envelope shared by every error path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorResponse {
    fn new(code: &str, message: String, suggestion: Option<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
                suggestion,
            },
        }
    }

    pub fn invalid_request(message: String) -> Self {
        Self::new("INVALID_REQUEST", message, None)
    }

    pub fn no_artisans(message: String, suggestion: String) -> Self {
        Self::new("NO_ARTISANS_AVAILABLE", message, Some(suggestion))
    }

    pub fn internal(message: String) -> Self {
        Self::new("INTERNAL_ERROR", message, None)
    }

    pub fn not_found(message: String) -> Self {
        Self::new("NOT_FOUND", message, None)
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_codes() {
        let err = ErrorResponse::no_artisans("none".to_string(), "broaden".to_string());
        assert!(!err.success);
        assert_eq!(err.error.code, "NO_ARTISANS_AVAILABLE");
        assert_eq!(err.error.suggestion.as_deref(), Some("broaden"));

        let err = ErrorResponse::internal("boom".to_string());
        assert_eq!(err.error.code, "INTERNAL_ERROR");
        assert!(err.error.suggestion.is_none());
    }

    #[test]
    fn test_suggestion_omitted_from_json() {
        let err = ErrorResponse::invalid_request("query text must not be empty".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("suggestion"));
    }
}

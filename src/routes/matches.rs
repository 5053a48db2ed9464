use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{MatchPipeline, PipelineError};
use crate::models::{
    ErrorResponse, FindArtisansRequest, FindArtisansResponse, HealthResponse, MatchData,
    MatchQuery, QueryAnalysis, SystemHealth,
};
use crate::services::{AnalysisCache, DecisionAnalytics, ProfileStoreClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MatchPipeline>,
    pub analytics: Arc<DecisionAnalytics>,
    pub cache: Arc<AnalysisCache>,
    pub store: Arc<ProfileStoreClient>,
}

/// Configure the matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await;
    let ai_healthy = state.pipeline.ai_service_healthy();

    let status = if store_healthy && ai_healthy {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matching artisans for a buyer query
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "query": "I need traditional pottery for my restaurant",
///   "maxResults": 20,
///   "sortBy": "relevance"
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindArtisansRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find request: {:?}", errors);
        return HttpResponse::BadRequest()
            .json(ErrorResponse::invalid_request(errors.to_string()));
    }

    let query = MatchQuery {
        raw_text: req.query.clone(),
        // Cap at 100 to prevent excessive retrievals
        max_results: req.max_results.min(100) as usize,
        sort_by: req.sort_by,
        timestamp: chrono::Utc::now(),
    };

    tracing::info!(
        "Matching query ({} chars, max {} results)",
        query.raw_text.len(),
        query.max_results
    );

    match state.pipeline.run(&query).await {
        Ok(outcome) => {
            tracing::info!(
                "Resolved '{}' ({:?}, confidence {:.2}), returning {} matches",
                outcome.analysis.profession,
                outcome.search_method,
                outcome.analysis.confidence,
                outcome.matches.len()
            );

            let data = MatchData {
                total_found: outcome.total_found,
                processing_time_ms: outcome.processing_time_ms,
                query_analysis: QueryAnalysis {
                    detected_profession: outcome.analysis.profession.clone(),
                    extracted_keywords: outcome.analysis.matched_keywords.clone(),
                    confidence: outcome.analysis.confidence,
                },
                system_health: SystemHealth {
                    ai_service_healthy: state.pipeline.ai_service_healthy(),
                    fallback_used: outcome.fallback_used,
                    cache_hit: outcome.cache_hit,
                },
                matches: outcome.matches,
            };

            HttpResponse::Ok().json(FindArtisansResponse::new(data))
        }
        Err(PipelineError::InvalidRequest(message)) => {
            HttpResponse::BadRequest().json(ErrorResponse::invalid_request(message))
        }
        Err(PipelineError::NoCandidatesFound { profession }) => {
            let (message, suggestion) = if profession.is_empty() {
                (
                    "We could not tell which craft you are looking for".to_string(),
                    "Try naming the craft or product, e.g. 'handmade pottery bowls'".to_string(),
                )
            } else {
                (
                    format!("No artisans currently offer {}", profession),
                    "Try broadening your search criteria or check back later".to_string(),
                )
            };
            HttpResponse::NotFound().json(ErrorResponse::no_artisans(message, suggestion))
        }
        Err(e @ PipelineError::RetrievalUnavailable(_)) => {
            tracing::error!("Match request failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal(
                "Candidate retrieval is temporarily unavailable".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MatchingSettings;
use crate::core::matcher::{normalize_profession, normalize_query, HeuristicMatcher};
use crate::core::scoring::ScoringEngine;
use crate::models::{
    CandidateProfile, DecisionRecord, MatchQuery, MatchSource, ProfessionMatch, RankedMatch,
    SearchMethod,
};
use crate::services::{AiClassifier, AnalysisCache, DecisionAnalytics, ProfileStoreClient, StoreError};

/// Errors a match request can surface to the caller
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Zero-result terminal state; mapped to a structured "no artisans"
    /// response, not an internal failure
    #[error("no artisans available for '{profession}'")]
    NoCandidatesFound { profession: String },

    #[error("candidate store unavailable: {0}")]
    RetrievalUnavailable(#[from] StoreError),
}

/// Everything a successful match run produces
#[derive(Debug)]
pub struct MatchOutcome {
    pub matches: Vec<RankedMatch>,
    pub total_found: usize,
    pub analysis: ProfessionMatch,
    pub search_method: SearchMethod,
    pub cache_hit: bool,
    pub fallback_used: bool,
    pub degraded: bool,
    pub processing_time_ms: u64,
}

/// Matching orchestrator
///
/// Sequences one request: normalize, cached or fresh classification
/// (heuristic first, AI escalation below the confidence threshold),
/// exact retrieval with a single widened-then-filtered fallback, scoring,
/// and a fire-and-forget decision emit. Construct one at startup and
/// share it; per-request state lives on the stack.
pub struct MatchPipeline {
    matcher: HeuristicMatcher,
    scoring: ScoringEngine,
    ai: Arc<AiClassifier>,
    cache: Arc<AnalysisCache>,
    store: Arc<ProfileStoreClient>,
    analytics: Arc<DecisionAnalytics>,
    settings: MatchingSettings,
    ai_healthy: AtomicBool,
}

impl MatchPipeline {
    pub fn new(
        ai: Arc<AiClassifier>,
        cache: Arc<AnalysisCache>,
        store: Arc<ProfileStoreClient>,
        analytics: Arc<DecisionAnalytics>,
        settings: MatchingSettings,
    ) -> Self {
        Self {
            matcher: HeuristicMatcher::new(),
            scoring: ScoringEngine::new(),
            ai,
            cache,
            store,
            analytics,
            settings,
            ai_healthy: AtomicBool::new(true),
        }
    }

    /// Whether the last AI fallback call succeeded
    pub fn ai_service_healthy(&self) -> bool {
        self.ai_healthy.load(Ordering::Relaxed)
    }

    /// Run one match request end to end
    pub async fn run(&self, query: &MatchQuery) -> Result<MatchOutcome, PipelineError> {
        let started = Instant::now();

        let normalized = normalize_query(&query.raw_text);
        if normalized.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "query text must not be empty".to_string(),
            ));
        }

        let max_results = query.max_results.min(self.settings.max_limit).max(1);

        let mut cache_hit = false;
        let mut fallback_used = false;
        let mut degraded = false;

        let analysis = match self.cache.get(&normalized).await {
            Some(mut cached) => {
                cache_hit = true;
                cached.source = MatchSource::Cache;
                cached
            }
            None => {
                let resolved = self
                    .classify(&normalized, &mut fallback_used, &mut degraded)
                    .await;
                // Unresolved classifications are not cached: a later
                // attempt should get another shot at the AI service
                if !resolved.is_unmatched() {
                    self.cache.put(&normalized, &resolved).await;
                }
                resolved
            }
        };

        if analysis.is_unmatched() {
            self.emit_decision(
                query, &normalized, &analysis, SearchMethod::Exact, 0, cache_hit, fallback_used,
                degraded, started,
            )
            .await;
            return Err(PipelineError::NoCandidatesFound {
                profession: String::new(),
            });
        }

        let mut search_method = SearchMethod::Exact;
        let mut candidates = self
            .store
            .find_by_profession(&analysis.profession, max_results)
            .await?;
        candidates = exact_profession_only(candidates, &analysis.profession);

        if candidates.is_empty() {
            // One widened retrieval, filtered client-side for strict
            // equality. Related professions are never substituted in.
            search_method = SearchMethod::Widened;
            let pool = self.store.fetch_pool(self.settings.widened_limit).await?;
            candidates = exact_profession_only(pool, &analysis.profession);
            candidates.truncate(max_results);
        }

        if candidates.is_empty() {
            self.emit_decision(
                query, &normalized, &analysis, search_method, 0, cache_hit, fallback_used,
                degraded, started,
            )
            .await;
            return Err(PipelineError::NoCandidatesFound {
                profession: analysis.profession.clone(),
            });
        }

        let total_found = candidates.len();
        let matches = self.scoring.score(candidates, &analysis, query.sort_by);

        let processing_time_ms = started.elapsed().as_millis() as u64;
        self.emit_decision(
            query,
            &normalized,
            &analysis,
            search_method,
            matches.len(),
            cache_hit,
            fallback_used,
            degraded,
            started,
        )
        .await;

        Ok(MatchOutcome {
            matches,
            total_found,
            analysis,
            search_method,
            cache_hit,
            fallback_used,
            degraded,
            processing_time_ms,
        })
    }

    /// Heuristic classification with bounded AI escalation.
    ///
    /// The AI result is accepted only when its confidence strictly beats
    /// the heuristic's. Timeout, transport failure, or a malformed body
    /// all degrade silently to the heuristic result.
    async fn classify(
        &self,
        normalized: &str,
        fallback_used: &mut bool,
        degraded: &mut bool,
    ) -> ProfessionMatch {
        let heuristic = self.matcher.detect(normalized);
        if heuristic.confidence >= self.settings.fallback_threshold {
            return heuristic;
        }

        *fallback_used = true;
        let deadline = Duration::from_secs(self.settings.ai_timeout_secs);

        match tokio::time::timeout(deadline, self.ai.classify(normalized)).await {
            Ok(Ok(ai)) => {
                self.ai_healthy.store(true, Ordering::Relaxed);
                if ai.confidence > heuristic.confidence {
                    ai
                } else {
                    heuristic
                }
            }
            Ok(Err(e)) => {
                self.ai_healthy.store(false, Ordering::Relaxed);
                tracing::warn!("AI fallback failed, keeping heuristic result: {}", e);
                *degraded = true;
                heuristic
            }
            Err(_) => {
                self.ai_healthy.store(false, Ordering::Relaxed);
                tracing::warn!(
                    "AI fallback timed out after {}s, keeping heuristic result",
                    self.settings.ai_timeout_secs
                );
                *degraded = true;
                heuristic
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn emit_decision(
        &self,
        query: &MatchQuery,
        normalized: &str,
        analysis: &ProfessionMatch,
        search_method: SearchMethod,
        result_count: usize,
        cache_hit: bool,
        fallback_used: bool,
        degraded: bool,
        started: Instant,
    ) {
        let record = DecisionRecord {
            id: Uuid::new_v4(),
            query_text: normalized.to_string(),
            resolved_profession: analysis.profession.clone(),
            confidence: analysis.confidence,
            source: analysis.source,
            search_method,
            result_count,
            processing_time_ms: started.elapsed().as_millis() as u64,
            cache_hit,
            fallback_used,
            classification_degraded: degraded,
            timestamp: query.timestamp,
            user_interaction: None,
        };

        self.analytics.record(record).await;
    }
}

/// Keep only candidates whose profession equals `profession` exactly
/// after normalization. Partial and fuzzy matches never pass.
fn exact_profession_only(
    candidates: Vec<CandidateProfile>,
    profession: &str,
) -> Vec<CandidateProfile> {
    candidates
        .into_iter()
        .filter(|c| normalize_profession(&c.profession) == profession)
        .collect()
}

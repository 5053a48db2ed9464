use crate::models::{
    CandidateProfile, ConfidenceLevel, MatchExplanation, PerformanceMetrics, ProfessionMatch,
    RankedMatch, SortPreference,
};

/// Candidates with no order history score neutrally instead of at zero
const NEUTRAL_PERFORMANCE_SCORE: f64 = 0.5;
/// Weight of the (always exact) profession match in the blended score
const PROFESSION_WEIGHT: f64 = 0.7;
const PERFORMANCE_WEIGHT: f64 = 0.3;
/// Order volume at which the order-count component saturates
const ORDER_SATURATION: f64 = 100.0;

/// Performance blend: 0.4 satisfaction + 0.3 completion + 0.3 order volume
pub fn performance_score(metrics: Option<&PerformanceMetrics>) -> f64 {
    match metrics {
        Some(m) => {
            let satisfaction = (m.customer_satisfaction / 5.0).clamp(0.0, 1.0);
            let completion = m.completion_rate.clamp(0.0, 1.0);
            let volume = (m.total_orders as f64 / ORDER_SATURATION).min(1.0);
            0.4 * satisfaction + 0.3 * completion + 0.3 * volume
        }
        None => NEUTRAL_PERFORMANCE_SCORE,
    }
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scoring and ranking engine
///
/// Every candidate handed to [`ScoringEngine::score`] already satisfies
/// exact profession equality, so the profession component is the constant
/// 0.7 and ordering is decided by historical performance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score, sort, and rank candidates.
    ///
    /// The sort is stable: ties keep retrieval order, which carries the
    /// store's own recency signal. Ranks are assigned 1..N afterwards.
    /// Sorting by performance uses the unrounded performance score;
    /// relevance is monotone in it, so relevance still never increases as
    /// rank increases.
    pub fn score(
        &self,
        candidates: Vec<CandidateProfile>,
        profession_match: &ProfessionMatch,
        sort_by: SortPreference,
    ) -> Vec<RankedMatch> {
        let confidence_level = if profession_match.confidence > 0.5 {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::Medium
        };

        let mut scored: Vec<(f64, RankedMatch)> = candidates
            .into_iter()
            .map(|candidate| {
                let performance = performance_score(candidate.performance.as_ref());
                let relevance = round2(PROFESSION_WEIGHT + PERFORMANCE_WEIGHT * performance);

                let sort_key = match sort_by {
                    SortPreference::Relevance => relevance,
                    SortPreference::Performance => performance,
                };

                let explanation = build_explanation(&candidate, profession_match, confidence_level);

                (
                    sort_key,
                    RankedMatch {
                        candidate,
                        relevance_score: relevance,
                        rank: 0,
                        explanation,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (_, mut result))| {
                result.rank = i + 1;
                result
            })
            .collect()
    }
}

fn build_explanation(
    candidate: &CandidateProfile,
    profession_match: &ProfessionMatch,
    confidence_level: ConfidenceLevel,
) -> MatchExplanation {
    let mut detailed_reasons = Vec::new();

    match candidate.performance.as_ref() {
        Some(m) => {
            detailed_reasons.push(format!(
                "Customer satisfaction {:.1}/5",
                m.customer_satisfaction
            ));
            detailed_reasons.push(format!("Completes {:.0}% of orders", m.completion_rate * 100.0));
            detailed_reasons.push(format!("{} orders fulfilled", m.total_orders));
        }
        None => {
            detailed_reasons.push("No order history yet, scored neutrally".to_string());
        }
    }

    MatchExplanation {
        primary_reason: format!("Exact match for {}", profession_match.profession),
        detailed_reasons,
        matched_keywords: profession_match.matched_keywords.clone(),
        confidence_level,
    }
}

use crate::core::keywords::PROFESSION_KEYWORDS;
use crate::models::{MatchSource, ProfessionMatch};

/// Per-matched-keyword confidence contribution
const HIT_WEIGHT: f64 = 0.35;
/// Contribution of the fraction of query tokens covered by keywords
const COVERAGE_WEIGHT: f64 = 0.5;

/// Normalize query text: lowercase, trim, strip punctuation, collapse
/// whitespace. The result doubles as the analysis cache key.
pub fn normalize_query(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a profession label for exact-equality comparison
pub fn normalize_profession(profession: &str) -> String {
    profession
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deterministic keyword classifier
///
/// Pure and I/O-free: tokenizes the normalized query and scores it against
/// the static profession table. An unmatched query yields confidence 0 and
/// an empty profession, which the pipeline treats as "must escalate".
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMatcher;

impl HeuristicMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Classify free-text into a profession guess with a 0-1 confidence.
    ///
    /// Confidence blends how many keywords matched with how much of the
    /// query they cover, capped at 1.0. Single-word keywords must equal a
    /// whole token; multi-word phrases match as substrings of the
    /// normalized text.
    pub fn detect(&self, text: &str) -> ProfessionMatch {
        let normalized = normalize_query(text);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if tokens.is_empty() {
            return ProfessionMatch::unmatched();
        }

        let mut best: Option<(f64, &'static str, Vec<String>)> = None;

        for entry in PROFESSION_KEYWORDS {
            let mut matched = Vec::new();
            let mut matched_tokens = 0usize;

            for kw in entry.keywords {
                if kw.contains(' ') {
                    if normalized.contains(*kw) {
                        matched.push((*kw).to_string());
                        matched_tokens += kw.split_whitespace().count();
                    }
                } else if tokens.iter().any(|t| t == kw) {
                    matched.push((*kw).to_string());
                    matched_tokens += 1;
                }
            }

            if matched.is_empty() {
                continue;
            }

            let coverage = matched_tokens as f64 / tokens.len() as f64;
            let confidence =
                (HIT_WEIGHT * matched.len() as f64 + COVERAGE_WEIGHT * coverage).min(1.0);

            // Strict greater-than keeps table order as the tie-break
            let better = match &best {
                None => true,
                Some((current, _, _)) => confidence > *current,
            };
            if better {
                best = Some((confidence, entry.profession, matched));
            }
        }

        match best {
            Some((confidence, profession, matched_keywords)) => ProfessionMatch {
                profession: profession.to_string(),
                confidence,
                matched_keywords,
                source: MatchSource::Heuristic,
            },
            None => ProfessionMatch::unmatched(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_query("  Hand-made POTTERY, please!  "),
            "hand made pottery please"
        );
        assert_eq!(normalize_query("...,!?"), "");
    }

    #[test]
    fn test_normalize_profession() {
        assert_eq!(normalize_profession("  Pottery "), "pottery");
        assert_eq!(normalize_profession("Wood  Working"), "wood working");
    }

    #[test]
    fn test_detect_pottery_with_high_confidence() {
        let matcher = HeuristicMatcher::new();
        let result = matcher.detect("I need traditional pottery for my restaurant");

        assert_eq!(result.profession, "pottery");
        assert!(
            result.confidence >= 0.6,
            "expected confidence above escalation threshold, got {}",
            result.confidence
        );
        assert_eq!(result.source, MatchSource::Heuristic);
        assert!(result.matched_keywords.contains(&"pottery".to_string()));
        assert!(result.matched_keywords.contains(&"traditional".to_string()));
    }

    #[test]
    fn test_detect_single_keyword_stays_below_threshold() {
        let matcher = HeuristicMatcher::new();
        let result = matcher.detect("something made of clay maybe");

        assert_eq!(result.profession, "pottery");
        assert!(result.confidence > 0.0);
        assert!(
            result.confidence < 0.6,
            "one ambiguous keyword should escalate, got {}",
            result.confidence
        );
    }

    #[test]
    fn test_detect_unmatched_query() {
        let matcher = HeuristicMatcher::new();
        let result = matcher.detect("please recommend a good accountant");

        assert!(result.is_unmatched());
        assert_eq!(result.confidence, 0.0);
        assert!(result.profession.is_empty());
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn test_detect_empty_input() {
        let matcher = HeuristicMatcher::new();
        assert!(matcher.detect("").is_unmatched());
        assert!(matcher.detect("   \t ").is_unmatched());
    }

    #[test]
    fn test_detect_phrase_keyword() {
        let matcher = HeuristicMatcher::new();
        let result = matcher.detect("a vase made with wheel throwing techniques");

        assert_eq!(result.profession, "pottery");
        assert!(result
            .matched_keywords
            .contains(&"wheel throwing".to_string()));
    }

    #[test]
    fn test_confidence_capped_at_one() {
        let matcher = HeuristicMatcher::new();
        let result = matcher.detect("pottery clay ceramic ceramics kiln terracotta glaze");

        assert_eq!(result.profession, "pottery");
        assert!(result.confidence <= 1.0);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_strongest_profession_wins() {
        let matcher = HeuristicMatcher::new();
        // One woodworking keyword vs two weaving keywords
        let result = matcher.detect("a woven wool blanket for a wooden bench");

        assert_eq!(result.profession, "weaving");
    }

    #[test]
    fn test_confidence_never_with_empty_profession() {
        let matcher = HeuristicMatcher::new();
        for text in ["clay", "random words here", "", "gold necklace"] {
            let result = matcher.detect(text);
            if result.confidence > 0.0 {
                assert!(!result.profession.is_empty());
            }
        }
    }
}

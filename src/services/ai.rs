use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::core::matcher::normalize_profession;
use crate::models::{MatchSource, ProfessionMatch};

/// Errors that can occur when calling the language-understanding service
///
/// All of them are recoverable from the pipeline's point of view: the
/// request degrades to the heuristic classification instead of failing.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("AI service returned error: {0}")]
    ApiError(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// Structured requirements extracted by the language service
#[derive(Debug, Clone, Deserialize)]
struct ExtractionPayload {
    profession: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    products: Vec<String>,
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    techniques: Vec<String>,
}

/// AI fallback classifier
///
/// Delegates to the external language-understanding service to extract
/// structured requirements (products, materials, techniques) and infer the
/// primary profession. Invoked by the pipeline only when the heuristic
/// classifier is not confident enough.
pub struct AiClassifier {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl AiClassifier {
    pub fn new(base_url: String, api_key: String, model: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            model,
            client,
        }
    }

    /// Classify a query, retrying at most once on failure.
    ///
    /// The caller bounds the whole call (both attempts) with a deadline
    /// and drops the future on expiry, cancelling any in-flight request.
    pub async fn classify(&self, text: &str) -> Result<ProfessionMatch, AiError> {
        match self.classify_once(text).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::debug!("AI classification attempt failed, retrying once: {}", e);
                self.classify_once(text).await
            }
        }
    }

    async fn classify_once(&self, text: &str) -> Result<ProfessionMatch, AiError> {
        let url = format!("{}/v1/extract", self.base_url.trim_end_matches('/'));

        let payload = serde_json::json!({
            "model": self.model,
            "text": text,
            "fields": ["profession", "products", "materials", "techniques"],
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::ApiError(format!(
                "extraction failed: {}",
                response.status()
            )));
        }

        let parsed: ExtractionPayload = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        from_payload(parsed)
    }
}

fn from_payload(payload: ExtractionPayload) -> Result<ProfessionMatch, AiError> {
    let profession = payload
        .profession
        .map(|p| normalize_profession(&p))
        .unwrap_or_default();
    let confidence = payload.confidence.unwrap_or(0.0).clamp(0.0, 1.0);

    if profession.is_empty() && confidence > 0.0 {
        return Err(AiError::InvalidResponse(
            "confidence reported without a profession".into(),
        ));
    }

    let mut matched_keywords = payload.products;
    matched_keywords.extend(payload.materials);
    matched_keywords.extend(payload.techniques);

    Ok(ProfessionMatch {
        profession,
        confidence,
        matched_keywords,
        source: MatchSource::AiFallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_creation() {
        let classifier = AiClassifier::new(
            "https://ai.test".to_string(),
            "test_key".to_string(),
            "requirement-extractor-v2".to_string(),
            4,
        );

        assert_eq!(classifier.base_url, "https://ai.test");
        assert_eq!(classifier.model, "requirement-extractor-v2");
    }

    #[test]
    fn test_payload_conversion() {
        let payload = ExtractionPayload {
            profession: Some(" Pottery ".to_string()),
            confidence: Some(0.82),
            products: vec!["bowls".to_string()],
            materials: vec!["clay".to_string()],
            techniques: vec![],
        };

        let result = from_payload(payload).unwrap();
        assert_eq!(result.profession, "pottery");
        assert_eq!(result.confidence, 0.82);
        assert_eq!(result.matched_keywords, vec!["bowls", "clay"]);
        assert_eq!(result.source, MatchSource::AiFallback);
    }

    #[test]
    fn test_confidence_clamped() {
        let payload = ExtractionPayload {
            profession: Some("weaving".to_string()),
            confidence: Some(1.7),
            products: vec![],
            materials: vec![],
            techniques: vec![],
        };

        assert_eq!(from_payload(payload).unwrap().confidence, 1.0);
    }

    #[test]
    fn test_missing_profession_zeroes_confidence() {
        let payload = ExtractionPayload {
            profession: None,
            confidence: None,
            products: vec![],
            materials: vec![],
            techniques: vec![],
        };

        let result = from_payload(payload).unwrap();
        assert!(result.is_unmatched());
    }

    #[test]
    fn test_confidence_without_profession_rejected() {
        let payload = ExtractionPayload {
            profession: Some("  ".to_string()),
            confidence: Some(0.9),
            products: vec![],
            materials: vec![],
            techniques: vec![],
        };

        assert!(from_payload(payload).is_err());
    }
}

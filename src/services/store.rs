use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::CandidateProfile;

/// Errors that can occur when interacting with the profile store
///
/// Any of these is fatal to the request that triggered the lookup: the
/// pipeline surfaces them as a retrieval failure and never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("store returned error: {0}")]
    ApiError(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// Candidate retrieval adapter over the profile store's documents API
///
/// Issues exact-match queries only. The widened zero-result fallback is a
/// plain capped listing; the pipeline filters it client-side for exact
/// profession equality.
pub struct ProfileStoreClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    profiles_collection: String,
    client: Client,
}

impl ProfileStoreClient {
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        profiles_collection: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            project_id,
            database_id,
            profiles_collection,
            client,
        }
    }

    /// Fetch profiles whose profession equals `profession` exactly.
    ///
    /// `profession` must already be normalized (lowercase, trimmed); the
    /// store indexes professions in the same form.
    pub async fn find_by_profession(
        &self,
        profession: &str,
        limit: usize,
    ) -> Result<Vec<CandidateProfile>, StoreError> {
        let queries = vec![
            format!("equal(\"profession\", \"{}\")", profession),
            format!("limit({})", limit),
        ];

        self.query_documents(&queries).await
    }

    /// Unfiltered capped listing used for the one-time widened retrieval
    pub async fn fetch_pool(&self, limit: usize) -> Result<Vec<CandidateProfile>, StoreError> {
        let queries = vec![format!("limit({})", limit)];

        self.query_documents(&queries).await
    }

    async fn query_documents(
        &self,
        queries: &[String],
    ) -> Result<Vec<CandidateProfile>, StoreError> {
        let queries_json = serde_json::to_string(queries)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        let encoded_queries = urlencoding::encode(&queries_json);

        let url = format!(
            "{}/databases/{}/collections/{}/documents?query={}",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.profiles_collection,
            encoded_queries
        );

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "profile query failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| StoreError::InvalidResponse("missing documents array".into()))?;

        let profiles: Vec<CandidateProfile> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value(data.clone()).ok()
            })
            .collect();

        tracing::debug!(
            "Profile store returned {} candidates for {} query terms",
            profiles.len(),
            queries.len()
        );

        Ok(profiles)
    }

    /// Cheap reachability probe for the health endpoint
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url.trim_end_matches('/'));

        match self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Profile store health check failed: {}", e);
                false
            }
        }
    }
}

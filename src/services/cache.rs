use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::ProfessionMatch;

/// Errors that can occur while setting up the cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),
}

/// Query analysis cache
///
/// Two-tier: always-on in-process L1 (moka) plus an optional shared Redis
/// L2. Keys are the normalized query text, values the serialized
/// classification. Entries are inserted whole and expire via TTL; a reader
/// never observes a partially written entry. Runtime Redis failures count
/// as misses, so a degraded cache only costs latency, never correctness.
pub struct AnalysisCache {
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    ttl_secs: u64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl AnalysisCache {
    /// Create a two-tier cache backed by Redis
    pub async fn connect(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        let mut cache = Self::in_memory(l1_size, ttl_secs);
        cache.redis = Some(Arc::new(tokio::sync::Mutex::new(redis)));
        Ok(cache)
    }

    /// Create an L1-only cache (tests, or Redis unavailable at startup)
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            l1_cache,
            redis: None,
            ttl_secs,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Look up a previous classification of this normalized query
    pub async fn get(&self, normalized_query: &str) -> Option<ProfessionMatch> {
        let key = Self::key(normalized_query);

        if let Some(bytes) = self.l1_cache.get(&key).await {
            if let Ok(analysis) = serde_json::from_slice(&bytes) {
                tracing::trace!("L1 cache hit: {}", key);
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                return Some(analysis);
            }
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Result<Option<String>, redis::RedisError> = redis::cmd("GET")
                .arg(&key)
                .query_async(&mut *conn)
                .await;
            drop(conn);

            match value {
                Ok(Some(json)) => {
                    if let Ok(analysis) = serde_json::from_str::<ProfessionMatch>(&json) {
                        tracing::trace!("L2 cache hit: {}", key);
                        // Populate L1 for subsequent lookups
                        self.l1_cache.insert(key, json.into_bytes()).await;
                        self.hit_count.fetch_add(1, Ordering::Relaxed);
                        return Some(analysis);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Redis lookup failed, treating as cache miss: {}", e);
                }
            }
        }

        tracing::trace!("Cache miss: {}", key);
        self.miss_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a classification under its normalized query text
    pub async fn put(&self, normalized_query: &str, analysis: &ProfessionMatch) {
        let key = Self::key(normalized_query);

        let json = match serde_json::to_string(analysis) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry for {}: {}", key, e);
                return;
            }
        };

        self.l1_cache.insert(key.clone(), json.clone().into_bytes()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let result: Result<(), redis::RedisError> = redis::cmd("SETEX")
                .arg(&key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await;
            drop(conn);

            if let Err(e) = result {
                tracing::warn!("Redis write failed, entry kept in L1 only: {}", e);
            }
        }

        tracing::trace!("Cache set: {}", key);
    }

    /// Drop a cached analysis from both tiers
    pub async fn invalidate(&self, normalized_query: &str) {
        let key = Self::key(normalized_query);
        self.l1_cache.invalidate(&key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let result: Result<(), redis::RedisError> =
                redis::cmd("DEL").arg(&key).query_async(&mut *conn).await;
            drop(conn);

            if let Err(e) = result {
                tracing::warn!("Redis invalidation failed for {}: {}", key, e);
            }
        }
    }

    /// Hit/miss statistics for the analytics surface
    pub fn stats(&self) -> CacheStats {
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStats {
            entry_count: self.l1_cache.entry_count(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }

    fn key(normalized_query: &str) -> String {
        format!("analysis:{}", normalized_query)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    #[serde(rename = "entryCount")]
    pub entry_count: u64,
    #[serde(rename = "hitCount")]
    pub hit_count: u64,
    #[serde(rename = "missCount")]
    pub miss_count: u64,
    #[serde(rename = "hitRate")]
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchSource;

    fn analysis(profession: &str, confidence: f64) -> ProfessionMatch {
        ProfessionMatch {
            profession: profession.to_string(),
            confidence,
            matched_keywords: vec![profession.to_string()],
            source: MatchSource::Heuristic,
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = AnalysisCache::in_memory(100, 60);

        cache.put("traditional pottery", &analysis("pottery", 0.84)).await;
        let hit = cache.get("traditional pottery").await.unwrap();

        assert_eq!(hit.profession, "pottery");
        assert_eq!(hit.confidence, 0.84);
    }

    #[tokio::test]
    async fn test_miss_and_invalidate() {
        let cache = AnalysisCache::in_memory(100, 60);

        assert!(cache.get("never stored").await.is_none());

        cache.put("woven rug", &analysis("weaving", 0.7)).await;
        cache.invalidate("woven rug").await;
        assert!(cache.get("woven rug").await.is_none());
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = AnalysisCache::in_memory(100, 60);

        cache.put("gold necklace", &analysis("jewelry", 0.9)).await;
        cache.get("gold necklace").await;
        cache.get("unknown query").await;
        cache.get("gold necklace").await;

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_redis_backed_roundtrip() {
        let cache = AnalysisCache::connect("redis://127.0.0.1:6379", 100, 60)
            .await
            .expect("Failed to create cache");

        cache.put("forged iron gate", &analysis("blacksmithing", 0.8)).await;
        let hit = cache.get("forged iron gate").await.unwrap();
        assert_eq!(hit.profession, "blacksmithing");
    }
}

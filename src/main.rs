mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpResponse, HttpServer};
use crate::config::Settings;
use crate::core::MatchPipeline;
use models::ErrorResponse;
use routes::matches::AppState;
use services::{AiClassifier, AnalysisCache, DecisionAnalytics, ProfileStoreClient};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Wrapper turning actix payload rejections into the standard envelope
#[derive(Debug)]
pub struct JsonRejection {
    message: String,
}

impl std::fmt::Display for JsonRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl error::ResponseError for JsonRejection {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(ErrorResponse::invalid_request(self.message.clone()))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonRejection {
        message: format!("Invalid JSON: {}", err),
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonRejection {
        message: format!("Invalid query: {}", err),
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Artisan Algo matching service (log level: {})...", log_level);

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize profile store client
    let store = Arc::new(ProfileStoreClient::new(
        settings.store.endpoint,
        settings.store.api_key,
        settings.store.project_id,
        settings.store.database_id,
        settings.store.profiles_collection,
    ));

    info!("Profile store client initialized");

    // Initialize AI fallback classifier
    let ai = Arc::new(AiClassifier::new(
        settings.ai.endpoint,
        settings.ai.api_key,
        settings.ai.model,
        settings.matching.ai_timeout_secs,
    ));

    info!("AI fallback classifier initialized (timeout: {}s)", settings.matching.ai_timeout_secs);

    // Initialize analysis cache; Redis is optional and its absence only
    // costs repeated classifications, never correctness
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(3600);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let cache = match &settings.cache.redis_url {
        Some(redis_url) => match AnalysisCache::connect(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!(
                    "Analysis cache initialized (L1: {} entries, TTL: {}s, Redis L2)",
                    l1_cache_size, cache_ttl
                );
                Arc::new(c)
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), continuing with L1-only cache", e);
                Arc::new(AnalysisCache::in_memory(l1_cache_size, cache_ttl))
            }
        },
        None => {
            info!(
                "Analysis cache initialized (L1: {} entries, TTL: {}s, no Redis)",
                l1_cache_size, cache_ttl
            );
            Arc::new(AnalysisCache::in_memory(l1_cache_size, cache_ttl))
        }
    };

    // Initialize decision analytics and start its drain worker
    let analytics = DecisionAnalytics::new(
        settings.analytics.queue_capacity,
        settings.analytics.retention,
    );
    analytics.spawn_worker(settings.analytics.tick_secs);

    info!(
        "Decision analytics initialized (queue: {}, retention: {})",
        settings.analytics.queue_capacity, settings.analytics.retention
    );

    // Build the matching pipeline
    let pipeline = Arc::new(MatchPipeline::new(
        ai,
        Arc::clone(&cache),
        Arc::clone(&store),
        Arc::clone(&analytics),
        settings.matching.clone(),
    ));

    info!(
        "Matching pipeline initialized (fallback threshold: {})",
        settings.matching.fallback_threshold
    );

    // Build application state
    let app_state = AppState {
        pipeline,
        analytics,
        cache,
        store,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

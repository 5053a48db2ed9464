use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    AlertRuleRequest, AlertSeverity, ErrorResponse, RecordInteractionRequest, UserInteraction,
};
use crate::routes::matches::AppState;
use crate::services::AnalyticsError;

/// Configure the administrative analytics routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/analytics")
            .route("/metrics", web::get().to(get_metrics))
            .route("/cache", web::get().to(get_cache_stats))
            .route("/patterns", web::get().to(get_query_patterns))
            .route("/decisions/export", web::get().to(export_decisions))
            .route("/decisions/{id}/interaction", web::post().to(record_interaction))
            .route("/alerts", web::get().to(list_alerts))
            .route("/alerts/{id}/acknowledge", web::post().to(acknowledge_alert))
            .route("/alerts/{id}/resolve", web::post().to(resolve_alert))
            .route("/rules", web::get().to(list_rules))
            .route("/rules", web::post().to(create_rule))
            .route("/rules/{id}", web::put().to(update_rule))
            .route("/rules/{id}", web::delete().to(delete_rule)),
    );
}

fn analytics_error(err: AnalyticsError) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found(err.to_string()))
}

/// Aggregate matching metrics
async fn get_metrics(state: web::Data<AppState>) -> impl Responder {
    state.analytics.process_pending().await;
    HttpResponse::Ok().json(state.analytics.metrics().await)
}

/// Query analysis cache statistics
async fn get_cache_stats(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.cache.stats())
}

#[derive(Debug, Deserialize)]
struct PatternsQuery {
    #[serde(rename = "windowSecs")]
    window_secs: Option<u64>,
}

/// Per-profession query summaries over a trailing window
async fn get_query_patterns(
    state: web::Data<AppState>,
    query: web::Query<PatternsQuery>,
) -> impl Responder {
    let window_secs = query.window_secs.unwrap_or(3600);
    HttpResponse::Ok().json(state.analytics.query_patterns(window_secs).await)
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: Option<String>,
    since: Option<DateTime<Utc>>,
}

/// Decision log export, JSON (default) or CSV
async fn export_decisions(
    state: web::Data<AppState>,
    query: web::Query<ExportQuery>,
) -> impl Responder {
    match query.format.as_deref().unwrap_or("json") {
        "csv" => {
            let body = state.analytics.export_csv(query.since).await;
            HttpResponse::Ok().content_type("text/csv").body(body)
        }
        "json" => match state.analytics.export_json(query.since).await {
            Ok(body) => HttpResponse::Ok()
                .content_type("application/json")
                .body(body),
            Err(e) => {
                tracing::error!("Decision export failed: {}", e);
                HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal("export failed".to_string()))
            }
        },
        other => HttpResponse::BadRequest().json(ErrorResponse::invalid_request(format!(
            "unsupported export format: {}",
            other
        ))),
    }
}

/// Append a click-through / conversion outcome to a decision record
async fn record_interaction(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<RecordInteractionRequest>,
) -> impl Responder {
    let interaction = UserInteraction {
        clicked_candidate_id: req.clicked_candidate_id.clone(),
        converted: req.converted,
        recorded_at: Utc::now(),
    };

    match state
        .analytics
        .update_interaction(path.into_inner(), interaction)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => analytics_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct AlertsQuery {
    severity: Option<AlertSeverity>,
}

async fn list_alerts(state: web::Data<AppState>, query: web::Query<AlertsQuery>) -> impl Responder {
    state.analytics.process_pending().await;
    HttpResponse::Ok().json(state.analytics.alerts(query.severity).await)
}

async fn acknowledge_alert(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.analytics.acknowledge_alert(path.into_inner()).await {
        Ok(alert) => HttpResponse::Ok().json(alert),
        Err(e) => analytics_error(e),
    }
}

async fn resolve_alert(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.analytics.resolve_alert(path.into_inner()).await {
        Ok(alert) => HttpResponse::Ok().json(alert),
        Err(e) => analytics_error(e),
    }
}

async fn list_rules(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.analytics.rules().await)
}

async fn create_rule(
    state: web::Data<AppState>,
    req: web::Json<AlertRuleRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::invalid_request(errors.to_string()));
    }

    let rule = state.analytics.create_rule(req.into_inner()).await;
    HttpResponse::Created().json(rule)
}

async fn update_rule(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<AlertRuleRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::invalid_request(errors.to_string()));
    }

    match state
        .analytics
        .update_rule(path.into_inner(), req.into_inner())
        .await
    {
        Ok(rule) => HttpResponse::Ok().json(rule),
        Err(e) => analytics_error(e),
    }
}

async fn delete_rule(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.analytics.delete_rule(path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => analytics_error(e),
    }
}

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use crate::models::{
    AggregateMetrics, Alert, AlertComparison, AlertMetric, AlertRule, AlertRuleRequest,
    AlertSeverity, DecisionRecord, MatchSource, QueryPattern, SearchMethod, UserInteraction,
};

/// Fired alerts kept before the oldest are evicted
const ALERT_RETENTION: usize = 1_000;

/// Errors surfaced by the administrative analytics API
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("decision not found: {0}")]
    DecisionNotFound(Uuid),

    #[error("alert rule not found: {0}")]
    RuleNotFound(Uuid),

    #[error("alert not found: {0}")]
    AlertNotFound(Uuid),
}

/// Lifetime totals folded from every ingested decision
#[derive(Debug, Default)]
struct Totals {
    requests: u64,
    confidence_sum: f64,
    processing_ms_sum: f64,
    cache_hits: u64,
    zero_results: u64,
    fallback_used: u64,
}

impl Totals {
    fn fold(&mut self, record: &DecisionRecord) {
        self.requests += 1;
        self.confidence_sum += record.confidence;
        self.processing_ms_sum += record.processing_time_ms as f64;
        if record.cache_hit {
            self.cache_hits += 1;
        }
        if record.result_count == 0 {
            self.zero_results += 1;
        }
        if record.fallback_used {
            self.fallback_used += 1;
        }
    }
}

#[derive(Debug, Default)]
struct AnalyticsState {
    /// Ingest queue; bounded, oldest entries dropped under pressure
    queue: VecDeque<DecisionRecord>,
    /// Retained decision ring, newest at the back
    decisions: VecDeque<DecisionRecord>,
    totals: Totals,
    rules: Vec<AlertRule>,
    alerts: Vec<Alert>,
}

/// Decision analytics and alerting
///
/// Ingest is fire-and-forget: [`DecisionAnalytics::record`] enqueues and
/// notifies the worker; it never blocks the matching path and a full
/// queue sheds the oldest pending record. The worker folds records into
/// rolling aggregates and evaluates alert rules on every drain and on a
/// periodic tick.
pub struct DecisionAnalytics {
    state: Mutex<AnalyticsState>,
    notify: Notify,
    queue_capacity: usize,
    retention: usize,
    dropped: AtomicU64,
}

impl DecisionAnalytics {
    pub fn new(queue_capacity: usize, retention: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(AnalyticsState::default()),
            notify: Notify::new(),
            queue_capacity: queue_capacity.max(1),
            retention: retention.max(1),
            dropped: AtomicU64::new(0),
        })
    }

    /// Start the background drain/evaluation task
    pub fn spawn_worker(self: &Arc<Self>, tick_secs: u64) {
        let analytics = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(tick_secs.max(1)));
            loop {
                tokio::select! {
                    _ = analytics.notify.notified() => {}
                    _ = tick.tick() => {}
                }
                analytics.process_pending().await;
            }
        });
    }

    /// Enqueue one decision for ingestion. Never blocks, never fails.
    pub async fn record(&self, record: DecisionRecord) -> Uuid {
        let id = record.id;

        let mut state = self.state.lock().await;
        if state.queue.len() >= self.queue_capacity {
            state.queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Analytics queue full, dropped oldest pending decision");
        }
        state.queue.push_back(record);
        drop(state);

        self.notify.notify_one();
        id
    }

    /// Drain the ingest queue and re-evaluate alert rules.
    ///
    /// Called by the worker; tests call it directly to make ingestion
    /// deterministic.
    pub async fn process_pending(&self) {
        let mut state = self.state.lock().await;

        while let Some(record) = state.queue.pop_front() {
            state.totals.fold(&record);
            state.decisions.push_back(record);
            if state.decisions.len() > self.retention {
                state.decisions.pop_front();
            }
        }

        evaluate_rules(&mut state, Utc::now());
    }

    /// Append a buyer interaction outcome to an already-logged decision
    pub async fn update_interaction(
        &self,
        id: Uuid,
        interaction: UserInteraction,
    ) -> Result<(), AnalyticsError> {
        // Make sure queued records have landed before searching
        self.process_pending().await;

        let mut state = self.state.lock().await;
        let record = state
            .decisions
            .iter_mut()
            .rev()
            .find(|d| d.id == id)
            .ok_or(AnalyticsError::DecisionNotFound(id))?;

        record.user_interaction = Some(interaction);
        Ok(())
    }

    /// Lifetime aggregate metrics
    pub async fn metrics(&self) -> AggregateMetrics {
        let state = self.state.lock().await;
        let t = &state.totals;
        let requests = t.requests;
        let div = |sum: f64| if requests > 0 { sum / requests as f64 } else { 0.0 };

        AggregateMetrics {
            total_requests: requests,
            avg_confidence: div(t.confidence_sum),
            avg_processing_time_ms: div(t.processing_ms_sum),
            cache_hit_rate: div(t.cache_hits as f64),
            zero_result_rate: div(t.zero_results as f64),
            fallback_rate: div(t.fallback_used as f64),
            dropped_records: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// List fired alerts, optionally filtered by severity
    pub async fn alerts(&self, severity: Option<AlertSeverity>) -> Vec<Alert> {
        let state = self.state.lock().await;
        state
            .alerts
            .iter()
            .filter(|a| severity.map_or(true, |s| a.severity == s))
            .cloned()
            .collect()
    }

    pub async fn acknowledge_alert(&self, id: Uuid) -> Result<Alert, AnalyticsError> {
        self.set_alert_flag(id, |a| a.acknowledged = true).await
    }

    pub async fn resolve_alert(&self, id: Uuid) -> Result<Alert, AnalyticsError> {
        self.set_alert_flag(id, |a| a.resolved = true).await
    }

    async fn set_alert_flag(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut Alert),
    ) -> Result<Alert, AnalyticsError> {
        let mut state = self.state.lock().await;
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AnalyticsError::AlertNotFound(id))?;

        apply(alert);
        Ok(alert.clone())
    }

    pub async fn rules(&self) -> Vec<AlertRule> {
        self.state.lock().await.rules.clone()
    }

    pub async fn create_rule(&self, request: AlertRuleRequest) -> AlertRule {
        let rule = AlertRule {
            id: Uuid::new_v4(),
            name: request.name,
            metric: request.metric,
            comparison: request.comparison,
            threshold: request.threshold,
            time_window_secs: request.time_window_secs,
            severity: request.severity,
            enabled: request.enabled,
            cooldown_secs: request.cooldown_secs,
            last_triggered: None,
        };

        let mut state = self.state.lock().await;
        state.rules.push(rule.clone());
        rule
    }

    pub async fn update_rule(
        &self,
        id: Uuid,
        request: AlertRuleRequest,
    ) -> Result<AlertRule, AnalyticsError> {
        let mut state = self.state.lock().await;
        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AnalyticsError::RuleNotFound(id))?;

        rule.name = request.name;
        rule.metric = request.metric;
        rule.comparison = request.comparison;
        rule.threshold = request.threshold;
        rule.time_window_secs = request.time_window_secs;
        rule.severity = request.severity;
        rule.enabled = request.enabled;
        rule.cooldown_secs = request.cooldown_secs;

        Ok(rule.clone())
    }

    pub async fn delete_rule(&self, id: Uuid) -> Result<(), AnalyticsError> {
        let mut state = self.state.lock().await;
        let before = state.rules.len();
        state.rules.retain(|r| r.id != id);

        if state.rules.len() == before {
            return Err(AnalyticsError::RuleNotFound(id));
        }
        Ok(())
    }

    /// Export retained decisions as a JSON array
    pub async fn export_json(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<String, serde_json::Error> {
        self.process_pending().await;

        let state = self.state.lock().await;
        let records: Vec<&DecisionRecord> = state
            .decisions
            .iter()
            .filter(|d| since.map_or(true, |s| d.timestamp >= s))
            .collect();

        serde_json::to_string(&records)
    }

    /// Export retained decisions as CSV
    pub async fn export_csv(&self, since: Option<DateTime<Utc>>) -> String {
        self.process_pending().await;

        let state = self.state.lock().await;
        let mut out = String::from(
            "id,timestamp,queryText,resolvedProfession,confidence,source,searchMethod,\
             resultCount,processingTimeMs,cacheHit,fallbackUsed,classificationDegraded,\
             clickedCandidateId,converted\n",
        );

        for d in state
            .decisions
            .iter()
            .filter(|d| since.map_or(true, |s| d.timestamp >= s))
        {
            let (clicked, converted) = match &d.user_interaction {
                Some(i) => (
                    i.clicked_candidate_id.clone().unwrap_or_default(),
                    i.converted.to_string(),
                ),
                None => (String::new(), String::new()),
            };

            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                d.id,
                d.timestamp.to_rfc3339(),
                csv_escape(&d.query_text),
                csv_escape(&d.resolved_profession),
                d.confidence,
                source_label(d.source),
                method_label(d.search_method),
                d.result_count,
                d.processing_time_ms,
                d.cache_hit,
                d.fallback_used,
                d.classification_degraded,
                csv_escape(&clicked),
                converted,
            ));
        }

        out
    }

    /// Per-profession request summaries over a trailing window
    pub async fn query_patterns(&self, window_secs: u64) -> Vec<QueryPattern> {
        self.process_pending().await;

        let cutoff = Utc::now() - ChronoDuration::seconds(window_secs as i64);
        let state = self.state.lock().await;

        let mut grouped: HashMap<String, (u64, f64, u64)> = HashMap::new();
        for d in state.decisions.iter().filter(|d| d.timestamp >= cutoff) {
            let profession = if d.resolved_profession.is_empty() {
                "unclassified".to_string()
            } else {
                d.resolved_profession.clone()
            };
            let entry = grouped.entry(profession).or_default();
            entry.0 += 1;
            entry.1 += d.confidence;
            if d.result_count == 0 {
                entry.2 += 1;
            }
        }

        let mut patterns: Vec<QueryPattern> = grouped
            .into_iter()
            .map(|(profession, (requests, confidence_sum, zero_results))| QueryPattern {
                profession,
                requests,
                avg_confidence: confidence_sum / requests as f64,
                zero_results,
            })
            .collect();

        patterns.sort_by(|a, b| b.requests.cmp(&a.requests));
        patterns
    }
}

/// Evaluate every enabled rule against its trailing window.
///
/// A rule fires only when its comparison holds, the window saw at least
/// one request, and the cooldown since `last_triggered` has elapsed.
fn evaluate_rules(state: &mut AnalyticsState, now: DateTime<Utc>) {
    let mut fired: Vec<Alert> = Vec::new();

    for rule in state.rules.iter_mut().filter(|r| r.enabled) {
        let cooldown_ok = rule.last_triggered.map_or(true, |t| {
            now - t >= ChronoDuration::seconds(rule.cooldown_secs as i64)
        });
        if !cooldown_ok {
            continue;
        }

        let cutoff = now - ChronoDuration::seconds(rule.time_window_secs as i64);
        let value = match windowed_metric(&state.decisions, rule.metric, cutoff) {
            Some(v) => v,
            None => continue,
        };

        let breached = match rule.comparison {
            AlertComparison::Above => value > rule.threshold,
            AlertComparison::Below => value < rule.threshold,
        };
        if !breached {
            continue;
        }

        rule.last_triggered = Some(now);
        fired.push(Alert {
            id: Uuid::new_v4(),
            rule_id: rule.id,
            severity: rule.severity,
            message: format!(
                "{}: {:?} is {:.3}, threshold {:?} {:.3} over {}s",
                rule.name,
                rule.metric,
                value,
                rule.comparison,
                rule.threshold,
                rule.time_window_secs
            ),
            metric_value: value,
            triggered_at: now,
            acknowledged: false,
            resolved: false,
        });
    }

    for alert in fired {
        tracing::warn!("Alert fired: {}", alert.message);
        state.alerts.push(alert);
        if state.alerts.len() > ALERT_RETENTION {
            state.alerts.remove(0);
        }
    }
}

fn windowed_metric(
    decisions: &VecDeque<DecisionRecord>,
    metric: AlertMetric,
    cutoff: DateTime<Utc>,
) -> Option<f64> {
    let mut window = Totals::default();
    for d in decisions.iter().rev().take_while(|d| d.timestamp >= cutoff) {
        window.fold(d);
    }

    if window.requests == 0 {
        return None;
    }
    let requests = window.requests as f64;

    Some(match metric {
        AlertMetric::AvgConfidence => window.confidence_sum / requests,
        AlertMetric::AvgProcessingTimeMs => window.processing_ms_sum / requests,
        AlertMetric::CacheHitRate => window.cache_hits as f64 / requests,
        AlertMetric::ZeroResultRate => window.zero_results as f64 / requests,
        AlertMetric::FallbackRate => window.fallback_used as f64 / requests,
    })
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn source_label(source: MatchSource) -> &'static str {
    match source {
        MatchSource::Heuristic => "heuristic",
        MatchSource::AiFallback => "ai-fallback",
        MatchSource::Cache => "cache",
    }
}

fn method_label(method: SearchMethod) -> &'static str {
    match method {
        SearchMethod::Exact => "exact",
        SearchMethod::Widened => "widened",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(profession: &str, confidence: f64, results: usize, fallback: bool) -> DecisionRecord {
        DecisionRecord {
            id: Uuid::new_v4(),
            query_text: format!("looking for {}", profession),
            resolved_profession: profession.to_string(),
            confidence,
            source: MatchSource::Heuristic,
            search_method: SearchMethod::Exact,
            result_count: results,
            processing_time_ms: 12,
            cache_hit: false,
            fallback_used: fallback,
            classification_degraded: false,
            timestamp: Utc::now(),
            user_interaction: None,
        }
    }

    fn rule(metric: AlertMetric, comparison: AlertComparison, threshold: f64) -> AlertRuleRequest {
        AlertRuleRequest {
            name: "test rule".to_string(),
            metric,
            comparison,
            threshold,
            time_window_secs: 3600,
            severity: AlertSeverity::Warning,
            enabled: true,
            cooldown_secs: 600,
        }
    }

    #[tokio::test]
    async fn test_record_and_metrics() {
        let analytics = DecisionAnalytics::new(64, 1000);

        analytics.record(decision("pottery", 0.8, 5, false)).await;
        analytics.record(decision("weaving", 0.4, 0, true)).await;
        analytics.process_pending().await;

        let metrics = analytics.metrics().await;
        assert_eq!(metrics.total_requests, 2);
        assert!((metrics.avg_confidence - 0.6).abs() < 1e-9);
        assert!((metrics.zero_result_rate - 0.5).abs() < 1e-9);
        assert!((metrics.fallback_rate - 0.5).abs() < 1e-9);
        assert_eq!(metrics.dropped_records, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_oldest() {
        let analytics = DecisionAnalytics::new(2, 1000);

        let first = analytics.record(decision("pottery", 0.9, 3, false)).await;
        analytics.record(decision("weaving", 0.9, 3, false)).await;
        analytics.record(decision("jewelry", 0.9, 3, false)).await;
        analytics.process_pending().await;

        let metrics = analytics.metrics().await;
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.dropped_records, 1);

        // The dropped record was the oldest
        let err = analytics
            .update_interaction(
                first,
                UserInteraction {
                    clicked_candidate_id: None,
                    converted: false,
                    recorded_at: Utc::now(),
                },
            )
            .await;
        assert!(matches!(err, Err(AnalyticsError::DecisionNotFound(_))));
    }

    #[tokio::test]
    async fn test_interaction_appended() {
        let analytics = DecisionAnalytics::new(64, 1000);
        let id = analytics.record(decision("pottery", 0.8, 5, false)).await;

        analytics
            .update_interaction(
                id,
                UserInteraction {
                    clicked_candidate_id: Some("artisan-1".to_string()),
                    converted: true,
                    recorded_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let json = analytics.export_json(None).await.unwrap();
        assert!(json.contains("artisan-1"));
    }

    #[tokio::test]
    async fn test_alert_fires_and_respects_cooldown() {
        let analytics = DecisionAnalytics::new(64, 1000);
        analytics
            .create_rule(rule(AlertMetric::ZeroResultRate, AlertComparison::Above, 0.5))
            .await;

        analytics.record(decision("basketry", 0.7, 0, false)).await;
        analytics.process_pending().await;

        let alerts = analytics.alerts(None).await;
        assert_eq!(alerts.len(), 1);
        assert!(!alerts[0].acknowledged);
        assert!(!alerts[0].resolved);

        // Within cooldown: another breaching write fires nothing new
        analytics.record(decision("basketry", 0.7, 0, false)).await;
        analytics.process_pending().await;
        assert_eq!(analytics.alerts(None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_alert_not_fired_without_data() {
        let analytics = DecisionAnalytics::new(64, 1000);
        analytics
            .create_rule(rule(AlertMetric::AvgConfidence, AlertComparison::Below, 0.9))
            .await;

        analytics.process_pending().await;
        assert!(analytics.alerts(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_alert_severity_filter_and_lifecycle() {
        let analytics = DecisionAnalytics::new(64, 1000);
        analytics
            .create_rule(rule(AlertMetric::FallbackRate, AlertComparison::Above, 0.1))
            .await;

        analytics.record(decision("pottery", 0.3, 2, true)).await;
        analytics.process_pending().await;

        assert!(analytics.alerts(Some(AlertSeverity::Critical)).await.is_empty());
        let warnings = analytics.alerts(Some(AlertSeverity::Warning)).await;
        assert_eq!(warnings.len(), 1);

        let id = warnings[0].id;
        let acked = analytics.acknowledge_alert(id).await.unwrap();
        assert!(acked.acknowledged);
        let resolved = analytics.resolve_alert(id).await.unwrap();
        assert!(resolved.resolved);
    }

    #[tokio::test]
    async fn test_rule_crud() {
        let analytics = DecisionAnalytics::new(64, 1000);
        let created = analytics
            .create_rule(rule(AlertMetric::CacheHitRate, AlertComparison::Below, 0.2))
            .await;

        let mut update = rule(AlertMetric::CacheHitRate, AlertComparison::Below, 0.4);
        update.enabled = false;
        let updated = analytics.update_rule(created.id, update).await.unwrap();
        assert_eq!(updated.threshold, 0.4);
        assert!(!updated.enabled);

        analytics.delete_rule(created.id).await.unwrap();
        assert!(analytics.rules().await.is_empty());
        assert!(analytics.delete_rule(created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_query_patterns_grouped_and_sorted() {
        let analytics = DecisionAnalytics::new(64, 1000);
        analytics.record(decision("pottery", 0.8, 4, false)).await;
        analytics.record(decision("pottery", 0.6, 0, false)).await;
        analytics.record(decision("weaving", 0.9, 2, false)).await;

        let patterns = analytics.query_patterns(3600).await;
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].profession, "pottery");
        assert_eq!(patterns[0].requests, 2);
        assert_eq!(patterns[0].zero_results, 1);
        assert!((patterns[0].avg_confidence - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_csv_export_escapes_fields() {
        let analytics = DecisionAnalytics::new(64, 1000);
        let mut record = decision("pottery", 0.8, 1, false);
        record.query_text = "bowls, plates and \"mugs\"".to_string();
        analytics.record(record).await;

        let csv = analytics.export_csv(None).await;
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("id,timestamp,queryText"));
        let row = lines.next().unwrap();
        assert!(row.contains("\"bowls, plates and \"\"mugs\"\"\""));
    }
}

//! Call statistics for the upstream APIs
//!
//! Tracks success rates, error counts and response times per upstream

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::error::ProxyError;

pub const KANA: &str = "kana";
pub const LEGACY: &str = "legacy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamMetrics {
    pub upstream: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub average_response_time_ms: f64,
    pub total_response_time_ms: u64,
    pub timeout_count: u64,
}

impl UpstreamMetrics {
    pub fn new(upstream: String) -> Self {
        Self {
            upstream,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            last_success: None,
            last_failure: None,
            last_error: None,
            average_response_time_ms: 0.0,
            total_response_time_ms: 0,
            timeout_count: 0,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }

    pub fn record_success(&mut self, response_time: Duration) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.last_success = Some(Utc::now());

        let response_ms = response_time.as_millis() as u64;
        self.total_response_time_ms += response_ms;
        self.average_response_time_ms =
            self.total_response_time_ms as f64 / self.successful_requests as f64;
    }

    pub fn record_failure(&mut self, error: String, timed_out: bool) {
        self.total_requests += 1;
        self.failed_requests += 1;
        self.last_failure = Some(Utc::now());

        if timed_out {
            self.timeout_count += 1;
        }
        self.last_error = Some(error);
    }
}

/// Shared tracker, one entry per upstream
pub struct MetricsTracker {
    metrics: Arc<Mutex<HashMap<String, UpstreamMetrics>>>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn with_entry<T>(&self, upstream: &str, f: impl FnOnce(&mut UpstreamMetrics) -> T) -> T {
        let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        let entry = metrics
            .entry(upstream.to_string())
            .or_insert_with(|| UpstreamMetrics::new(upstream.to_string()));
        f(entry)
    }

    pub fn record_success(&self, upstream: &str, response_time: Duration) {
        self.with_entry(upstream, |m| {
            m.record_success(response_time);
            log::debug!(
                "[{}] Success - Response time: {}ms - Success rate: {:.2}%",
                upstream,
                response_time.as_millis(),
                m.success_rate()
            );
        });
    }

    pub fn record_failure(&self, upstream: &str, err: &ProxyError) {
        let error = err.to_string();
        let timed_out = err.is_timeout();
        self.with_entry(upstream, |m| {
            m.record_failure(error.clone(), timed_out);
            log::warn!(
                "[{}] Failure - Error: {} - Success rate: {:.2}%",
                upstream,
                error,
                m.success_rate()
            );
        });
    }

    pub fn get_metrics(&self, upstream: &str) -> Option<UpstreamMetrics> {
        let metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        metrics.get(upstream).cloned()
    }

    /// Snapshot sorted by upstream name
    pub fn get_all_metrics(&self) -> Vec<UpstreamMetrics> {
        let metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<UpstreamMetrics> = metrics.values().cloned().collect();
        all.sort_by(|a, b| a.upstream.cmp(&b.upstream));
        all
    }

    pub fn log_summary(&self) {
        for m in self.get_all_metrics() {
            log::info!(
                "[{}] {} requests, {:.2}% success, avg {:.2}ms, {} timeouts",
                m.upstream,
                m.total_requests,
                m.success_rate(),
                m.average_response_time_ms,
                m.timeout_count
            );
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Time an upstream call and record its outcome
pub async fn track_request<F, T>(
    tracker: &MetricsTracker,
    upstream: &str,
    operation: F,
) -> Result<T, ProxyError>
where
    F: std::future::Future<Output = Result<T, ProxyError>>,
{
    let start = Instant::now();
    let result = operation.await;
    let duration = start.elapsed();

    match &result {
        Ok(_) => tracker.record_success(upstream, duration),
        Err(e) => tracker.record_failure(upstream, e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = UpstreamMetrics::new(KANA.to_string());
        assert_eq!(metrics.upstream, "kana");
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.success_rate(), 0.0);
    }

    #[test]
    fn test_record_failure() {
        let mut metrics = UpstreamMetrics::new(LEGACY.to_string());
        metrics.record_failure("upstream did not answer within 1000ms".to_string(), true);

        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.timeout_count, 1);
        assert_eq!(metrics.success_rate(), 0.0);
        assert!(metrics.last_failure.is_some());
    }

    #[test]
    fn test_success_rate_calculation() {
        let mut metrics = UpstreamMetrics::new(KANA.to_string());

        metrics.record_success(Duration::from_millis(100));
        metrics.record_success(Duration::from_millis(200));
        metrics.record_failure("Error".to_string(), false);

        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.average_response_time_ms, 150.0);
        assert!((metrics.success_rate() - 66.66).abs() < 0.1);
    }

    #[tokio::test]
    async fn test_track_request() {
        let tracker = MetricsTracker::new();

        let ok: Result<u8, ProxyError> = track_request(&tracker, KANA, async { Ok(1) }).await;
        let err: Result<u8, ProxyError> = track_request(&tracker, LEGACY, async {
            Err(ProxyError::MalformedResponse("boom".to_string()))
        })
        .await;

        assert!(ok.is_ok());
        assert!(err.is_err());
        assert_eq!(tracker.get_metrics(KANA).unwrap().success_rate(), 100.0);
        let legacy = tracker.get_metrics(LEGACY).unwrap();
        let expected = ProxyError::MalformedResponse("boom".into()).to_string();
        assert_eq!(legacy.last_error, Some(expected));
        assert_eq!(legacy.timeout_count, 0);

        let names: Vec<String> = tracker
            .get_all_metrics()
            .into_iter()
            .map(|m| m.upstream)
            .collect();
        assert_eq!(names, vec!["kana", "legacy"]);
    }

    #[tokio::test]
    async fn test_timeouts_counted_by_error_kind() {
        let tracker = MetricsTracker::new();

        let _: Result<(), ProxyError> =
            track_request(&tracker, LEGACY, async { Err(ProxyError::Timeout(300)) }).await;
        // wording alone does not make a timeout
        let _: Result<(), ProxyError> = track_request(&tracker, LEGACY, async {
            Err(ProxyError::MalformedResponse("request timed out".to_string()))
        })
        .await;

        let legacy = tracker.get_metrics(LEGACY).unwrap();
        assert_eq!(legacy.failed_requests, 2);
        assert_eq!(legacy.timeout_count, 1);
    }
}

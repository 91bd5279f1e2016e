use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use serde::Serialize;
use uuid::Uuid;

const MAX_SAMPLES: usize = 1000;
const MAX_RECENT_ERRORS: usize = 50;

/// Action correlation ID for tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-triggered actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Login,
    ShowIdeas,
    RecallIdeas,
    GenerateColoring,
}

/// Calls made against the generative service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamCall {
    ListModels,
    ChatCompletion,
    ImageGeneration,
}

/// Error categories for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,    // empty topic, no selection
    Credential,    // rejected or missing key
    RateLimited,   // quota or 429
    Timeout,       // upstream timeout
    Upstream,      // network, non-2xx, malformed body
    Storage,       // idea file read/write
    Internal,
}

impl ErrorCategory {
    pub fn from_error(error: &crate::Error) -> Self {
        match error {
            crate::Error::ValidationFailed(_) => ErrorCategory::Validation,

            crate::Error::InvalidCredential |
            crate::Error::NotAuthenticated => ErrorCategory::Credential,

            crate::Error::RateLimitExceeded(_) => ErrorCategory::RateLimited,

            crate::Error::Timeout(_) => ErrorCategory::Timeout,

            crate::Error::ServiceUnavailable(_) |
            crate::Error::Upstream { .. } |
            crate::Error::MalformedResponse(_) => ErrorCategory::Upstream,

            crate::Error::Storage(_) |
            crate::Error::Io(_) |
            crate::Error::Serialization(_) => ErrorCategory::Storage,

            _ => ErrorCategory::Internal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Credential => "credential",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Internal => "internal",
        }
    }
}

/// Counters for the interaction loop and its upstream calls
#[derive(Debug, Clone)]
pub struct ObservableMetrics {
    inner: Arc<RwLock<MetricsData>>,
    start_time: Instant,
}

#[derive(Debug, Default)]
struct MetricsData {
    actions_by_kind: HashMap<ActionKind, u64>,
    total_actions: u64,

    upstream_calls: HashMap<UpstreamCall, u64>,
    upstream_failures: u64,
    upstream_latencies: VecDeque<u64>,

    errors_by_category: HashMap<ErrorCategory, u64>,
    recent_errors: VecDeque<(Instant, ErrorCategory, String)>,

    ideas_generated: u64,
    images_generated: u64,
}

impl ObservableMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    /// Count a dispatched action and hand out its correlation id
    pub async fn start_action(&self, kind: ActionKind) -> RequestId {
        let mut data = self.inner.write().await;
        data.total_actions += 1;
        *data.actions_by_kind.entry(kind).or_insert(0) += 1;
        RequestId::new()
    }

    /// Record one upstream call and its latency
    pub async fn record_upstream(&self, call: UpstreamCall, elapsed: Duration, ok: bool) {
        let mut data = self.inner.write().await;
        *data.upstream_calls.entry(call).or_insert(0) += 1;
        if !ok {
            data.upstream_failures += 1;
        }
        data.upstream_latencies.push_back(elapsed.as_millis() as u64);
        if data.upstream_latencies.len() > MAX_SAMPLES {
            data.upstream_latencies.pop_front();
        }
    }

    /// Record an error with category
    pub async fn record_error(&self, error: &crate::Error) {
        let mut data = self.inner.write().await;

        let category = ErrorCategory::from_error(error);
        *data.errors_by_category.entry(category).or_insert(0) += 1;

        data.recent_errors.push_back((Instant::now(), category, error.to_string()));
        if data.recent_errors.len() > MAX_RECENT_ERRORS {
            data.recent_errors.pop_front();
        }
    }

    pub async fn record_ideas(&self, count: usize) {
        self.inner.write().await.ideas_generated += count as u64;
    }

    pub async fn record_images(&self, count: usize) {
        self.inner.write().await.images_generated += count as u64;
    }

    /// Calculate percentile from samples
    fn calculate_percentile(samples: &[u64], percentile: f64) -> u64 {
        if samples.is_empty() {
            return 0;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64) as usize;
        sorted[index]
    }

    /// Get detailed metrics snapshot
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let data = self.inner.read().await;
        let latencies: Vec<u64> = data.upstream_latencies.iter().copied().collect();

        MetricsSnapshot {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            total_actions: data.total_actions,
            actions_by_kind: data.actions_by_kind.clone(),
            upstream_calls: data.upstream_calls.clone(),
            upstream_failures: data.upstream_failures,
            upstream_latency_p50_ms: Self::calculate_percentile(&latencies, 50.0),
            upstream_latency_p95_ms: Self::calculate_percentile(&latencies, 95.0),
            errors_by_category: data.errors_by_category.clone(),
            ideas_generated: data.ideas_generated,
            images_generated: data.images_generated,
            recent_errors: Self::recent_errors(&data),
        }
    }

    /// Newest errors last, with their age
    fn recent_errors(data: &MetricsData) -> Vec<RecentError> {
        let now = Instant::now();

        data.recent_errors
            .iter()
            .map(|(time, category, msg)| RecentError {
                age_seconds: now.duration_since(*time).as_secs(),
                category: *category,
                message: msg.clone(),
            })
            .collect()
    }
}

impl Default for ObservableMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics snapshot for /metrics endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: u64,
    pub uptime_seconds: u64,

    pub total_actions: u64,
    pub actions_by_kind: HashMap<ActionKind, u64>,

    pub upstream_calls: HashMap<UpstreamCall, u64>,
    pub upstream_failures: u64,
    pub upstream_latency_p50_ms: u64,
    pub upstream_latency_p95_ms: u64,

    pub errors_by_category: HashMap<ErrorCategory, u64>,

    pub ideas_generated: u64,
    pub images_generated: u64,

    pub recent_errors: Vec<RecentError>,
}

/// One entry of the recent error ring buffer
#[derive(Debug, Clone, Serialize)]
pub struct RecentError {
    pub age_seconds: u64,
    pub category: ErrorCategory,
    pub message: String,
}

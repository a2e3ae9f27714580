//! # Monitor
//!
//! A non-intrusive wrapper around a [`crate::dispatcher::Dispatcher`] that
//! records a bounded history of per-request metrics and exposes percentile
//! latencies and per-path aggregates on demand.
//!
//! Recording a request is O(1): a ring-buffer push plus a handful of atomic
//! updates to that path's aggregate. Percentile computation sorts the
//! buffer's current contents and is therefore only paid at query time, on
//! the bounded buffer, not on every request.

mod memory;
mod ring;

pub use memory::MemoryStats;

use crate::ids::RequestId;
use ring::RingBuffer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// One observed request.
#[derive(Debug, Clone)]
pub struct MetricRecord {
    pub request_id: RequestId,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub elapsed_ms: f64,
    pub timestamp_ms: u64,
    pub heap_used_mb: f64,
}

/// Incrementally maintained aggregate for one path, across all methods and
/// statuses observed at it.
#[derive(Default)]
struct PathAggregate {
    count: AtomicUsize,
    total_ms_bits: AtomicU64, // f64 total stored as accumulated nanoseconds for atomicity
    min_ns: AtomicU64,
    max_ns: AtomicU64,
    error_count: AtomicUsize,
}

impl PathAggregate {
    fn new() -> Self {
        PathAggregate {
            count: AtomicUsize::new(0),
            total_ms_bits: AtomicU64::new(0),
            min_ns: AtomicU64::new(u64::MAX),
            max_ns: AtomicU64::new(0),
            error_count: AtomicUsize::new(0),
        }
    }

    fn record(&self, elapsed_ms: f64, is_error: bool) {
        let ns = (elapsed_ms * 1_000_000.0) as u64;
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_ms_bits.fetch_add(ns, Ordering::Relaxed);
        if is_error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }

        let mut cur = self.max_ns.load(Ordering::Relaxed);
        while ns > cur {
            match self.max_ns.compare_exchange_weak(cur, ns, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(x) => cur = x,
            }
        }
        let mut cur = self.min_ns.load(Ordering::Relaxed);
        while ns < cur {
            match self.min_ns.compare_exchange_weak(cur, ns, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(x) => cur = x,
            }
        }
    }

    fn snapshot(&self) -> PathStats {
        let count = self.count.load(Ordering::Relaxed);
        let total_ns = self.total_ms_bits.load(Ordering::Relaxed);
        let min_ns = self.min_ns.load(Ordering::Relaxed);
        let max_ns = self.max_ns.load(Ordering::Relaxed);
        PathStats {
            count,
            total_ms: total_ns as f64 / 1_000_000.0,
            avg_ms: if count > 0 { total_ns as f64 / 1_000_000.0 / count as f64 } else { 0.0 },
            min_ms: if count > 0 { min_ns as f64 / 1_000_000.0 } else { 0.0 },
            max_ms: max_ns as f64 / 1_000_000.0,
            error_count: self.error_count.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathStats {
    pub count: usize,
    pub total_ms: f64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub error_count: usize,
}

pub type RequestHook = Arc<dyn Fn(&MetricRecord) + Send + Sync>;

/// Configuration for a [`Monitor`].
#[derive(Clone)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub console: bool,
    pub slow_threshold_ms: f64,
    pub max_records: usize,
    pub sampling_rate: f64,
    pub excluded_paths: Vec<String>,
    pub tags: HashMap<String, String>,
    pub on_request: Option<RequestHook>,
    pub on_slow_request: Option<RequestHook>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            enabled: true,
            console: false,
            slow_threshold_ms: 1000.0,
            max_records: 1000,
            sampling_rate: 1.0,
            excluded_paths: Vec::new(),
            tags: HashMap::new(),
            on_request: None,
            on_slow_request: None,
        }
    }
}

impl MonitorConfig {
    /// Whether `path` should be skipped entirely, per `excluded_paths`.
    /// Entries ending in `*` match by prefix; others must match exactly.
    fn excludes(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                path.starts_with(prefix)
            } else {
                pattern == path
            }
        })
    }
}

/// Aggregated view returned by [`Monitor::status`].
#[derive(Debug, Clone)]
pub struct Status {
    pub enabled: bool,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub error_rate: f64,
    pub avg_response_time: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub by_path: HashMap<String, PathStats>,
    pub heap_used_mb: f64,
    pub heap_total_mb: f64,
    pub recent_requests: Vec<MetricRecord>,
}

/// Wraps request observation with a bounded ring buffer of records plus a
/// concurrently-updated per-path aggregate table.
pub struct Monitor {
    config: MonitorConfig,
    records: RwLock<RingBuffer<MetricRecord>>,
    by_path: dashmap::DashMap<String, Arc<PathAggregate>>,
    successful: AtomicUsize,
    failed: AtomicUsize,
    sample_counter: AtomicU64,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        let max_records = config.max_records;
        Monitor {
            config,
            records: RwLock::new(RingBuffer::new(max_records)),
            by_path: dashmap::DashMap::new(),
            successful: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            sample_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether this request should be recorded at all, applying both the
    /// exclusion list and the sampling rate.
    pub fn should_record(&self, path: &str) -> bool {
        if !self.config.enabled || self.config.excludes(path) {
            return false;
        }
        if self.config.sampling_rate >= 1.0 {
            return true;
        }
        if self.config.sampling_rate <= 0.0 {
            return false;
        }
        // deterministic sampling: record every Nth request, N = 1/rate.
        let n = (1.0 / self.config.sampling_rate).round().max(1.0) as u64;
        self.sample_counter.fetch_add(1, Ordering::Relaxed) % n == 0
    }

    /// Record one completed request. Fires `on_request` and, if the request
    /// exceeded `slow_threshold_ms`, `on_slow_request`.
    pub fn record(&self, method: &str, path: &str, status: u16, elapsed_ms: f64, request_id: RequestId) {
        let record = MetricRecord {
            request_id,
            method: method.to_string(),
            path: path.to_string(),
            status,
            elapsed_ms,
            timestamp_ms: now_ms(),
            heap_used_mb: MemoryStats::current().heap_used_mb(),
        };

        {
            let mut buf = self.records.write().expect("monitor ring buffer poisoned");
            buf.push(record.clone());
        }

        let is_error = status >= 400;
        if is_error {
            self.failed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.successful.fetch_add(1, Ordering::Relaxed);
        }

        self.by_path
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(PathAggregate::new()))
            .record(elapsed_ms, is_error);

        if let Some(hook) = &self.config.on_request {
            hook(&record);
        }
        if elapsed_ms > self.config.slow_threshold_ms {
            if let Some(hook) = &self.config.on_slow_request {
                hook(&record);
            }
            tracing::warn!(path = %path, elapsed_ms, "slow request observed");
        }
        if self.config.console {
            tracing::info!(method = %method, path = %path, status, elapsed_ms, "request recorded");
        }
    }

    pub fn path_stats(&self, path: &str) -> Option<PathStats> {
        self.by_path.get(path).map(|agg| agg.snapshot())
    }

    pub fn metrics(&self) -> Vec<MetricRecord> {
        self.records.read().expect("monitor ring buffer poisoned").to_vec()
    }

    pub fn reset(&self) {
        self.records.write().expect("monitor ring buffer poisoned").clear();
        self.by_path.clear();
        self.successful.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }

    pub fn status(&self) -> Status {
        let records = self.metrics();
        let mut latencies: Vec<f64> = records.iter().map(|r| r.elapsed_ms).collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let total = self.successful.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        let mem = MemoryStats::current();

        Status {
            enabled: self.config.enabled,
            total_requests: total,
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: failed,
            error_rate: if total > 0 { failed as f64 / total as f64 } else { 0.0 },
            avg_response_time: average(&latencies),
            p50: percentile(&latencies, 50.0),
            p95: percentile(&latencies, 95.0),
            p99: percentile(&latencies, 99.0),
            min_time: latencies.first().copied().unwrap_or(0.0),
            max_time: latencies.last().copied().unwrap_or(0.0),
            by_path: self
                .by_path
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().snapshot()))
                .collect(),
            heap_used_mb: mem.heap_used_mb(),
            heap_total_mb: mem.heap_total_mb(),
            recent_requests: records,
        }
    }
}

fn average(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

/// `status.p(k) == A[ceil(k/100 * n) - 1]` (zero-clamped).
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len() as f64;
    let idx = ((p / 100.0) * n).ceil() as i64 - 1;
    let idx = idx.max(0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

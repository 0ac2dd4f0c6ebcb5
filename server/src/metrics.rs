// Metrics collection and tracking

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use swar_speech::ErrorKind;

/// Latency samples kept for percentile calculation
const MAX_LATENCY_SAMPLES: usize = 1000;

/// Latency and outcome counters for speech generation
#[derive(Debug, Clone)]
pub struct GenerationMetrics {
    pub success_count: Arc<AtomicU64>,
    pub total_latency_ms: Arc<AtomicU64>,
    pub min_latency_ms: Arc<AtomicU64>,
    pub max_latency_ms: Arc<AtomicU64>,
    pub discarded_count: Arc<AtomicU64>,
    latency_samples: Arc<Mutex<VecDeque<u64>>>,
    errors_by_kind: Arc<Mutex<BTreeMap<&'static str, u64>>>,
}

impl GenerationMetrics {
    pub fn new() -> Self {
        Self {
            success_count: Arc::new(AtomicU64::new(0)),
            total_latency_ms: Arc::new(AtomicU64::new(0)),
            min_latency_ms: Arc::new(AtomicU64::new(u64::MAX)),
            max_latency_ms: Arc::new(AtomicU64::new(0)),
            discarded_count: Arc::new(AtomicU64::new(0)),
            latency_samples: Arc::new(Mutex::new(VecDeque::new())),
            errors_by_kind: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn record_success(&self, latency_ms: u64) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);

        if let Ok(mut samples) = self.latency_samples.lock() {
            samples.push_back(latency_ms);
            if samples.len() > MAX_LATENCY_SAMPLES {
                samples.pop_front();
            }
        }
    }

    pub fn record_error(&self, kind: ErrorKind) {
        if let Ok(mut errors) = self.errors_by_kind.lock() {
            *errors.entry(kind.as_str()).or_insert(0) += 1;
        }
    }

    /// A result that arrived after its request was superseded.
    pub fn record_discarded(&self) {
        self.discarded_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.success_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    pub fn percentile(&self, p: u8) -> u64 {
        let Ok(samples) = self.latency_samples.lock() else {
            return 0;
        };
        if samples.is_empty() {
            return 0;
        }
        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();
        let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
        sorted[index]
    }

    pub fn errors_by_kind(&self) -> BTreeMap<&'static str, u64> {
        self.errors_by_kind
            .lock()
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> GenerationStats {
        let success_count = self.success_count.load(Ordering::Relaxed);
        let min = self.min_latency_ms.load(Ordering::Relaxed);
        let errors_by_kind = self.errors_by_kind();
        GenerationStats {
            success_count,
            error_count: errors_by_kind.values().sum(),
            discarded_count: self.discarded_count.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
            min_latency_ms: if success_count == 0 { 0 } else { min },
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
            p50_latency_ms: self.percentile(50),
            p95_latency_ms: self.percentile(95),
            p99_latency_ms: self.percentile(99),
            errors_by_kind,
        }
    }
}

impl Default for GenerationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Comprehensive metrics structure
#[derive(Debug, Clone)]
pub struct AppMetrics {
    pub request_count: Arc<AtomicU64>,
    pub generation: GenerationMetrics,
    pub preview: GenerationMetrics,
    started: Instant,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            generation: GenerationMetrics::new(),
            preview: GenerationMetrics::new(),
            started: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub request_count: u64,
    pub uptime_seconds: u64,
    pub generation: GenerationStats,
    pub preview: GenerationStats,
    pub playback: PlaybackStats,
    pub history_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerationStats {
    pub success_count: u64,
    pub error_count: u64,
    pub discarded_count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
    pub errors_by_kind: BTreeMap<&'static str, u64>,
}

#[derive(Serialize)]
pub struct PlaybackStats {
    pub active_slots: usize,
    pub open_flows: usize,
    pub released_flows: u64,
}

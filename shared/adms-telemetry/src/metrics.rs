//! Metrics primitives

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Simple counter metric
#[derive(Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
    name: String,
}

impl Counter {
    pub fn new(name: &str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name: name.to_string(),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Histogram over the most recent samples
#[derive(Clone)]
pub struct Histogram {
    samples: Arc<parking_lot::Mutex<VecDeque<f64>>>,
    name: String,
    max_samples: usize,
}

/// Point-in-time view of a histogram
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

impl Histogram {
    pub fn new(name: &str) -> Self {
        Self::with_max_samples(name, 10_000)
    }

    pub fn with_max_samples(name: &str, max_samples: usize) -> Self {
        Self {
            samples: Arc::new(parking_lot::Mutex::new(VecDeque::with_capacity(max_samples.min(1000)))),
            name: name.to_string(),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&self, value: f64) {
        let mut samples = self.samples.lock();
        if samples.len() >= self.max_samples {
            samples.pop_front();
        }
        samples.push_back(value);
    }

    pub fn percentile(&self, p: f64) -> f64 {
        let mut sorted: Vec<f64> = self.samples.lock().iter().copied().collect();
        if sorted.is_empty() {
            return 0.0;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((sorted.len() as f64) * p / 100.0) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn mean(&self) -> f64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn count(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn summary(&self) -> HistogramSummary {
        HistogramSummary {
            count: self.count(),
            mean: self.mean(),
            p50: self.percentile(50.0),
            p95: self.percentile(95.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new("messages_processed");
        assert_eq!(counter.get(), 0);
        counter.inc();
        assert_eq!(counter.get(), 1);
        counter.add(5);
        assert_eq!(counter.get(), 6);
        assert_eq!(counter.name(), "messages_processed");
    }

    #[test]
    fn test_histogram() {
        let hist = Histogram::new("processing_ms");
        hist.record(1.0);
        hist.record(2.0);
        hist.record(3.0);
        hist.record(4.0);
        hist.record(5.0);

        assert!((hist.mean() - 3.0).abs() < 0.001);
        assert!((hist.percentile(50.0) - 3.0).abs() < 0.001);

        let summary = hist.summary();
        assert_eq!(summary.count, 5);
        assert!((summary.p95 - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_histogram_keeps_latest_samples() {
        let hist = Histogram::with_max_samples("processing_ms", 3);
        for v in [100.0, 1.0, 2.0, 3.0] {
            hist.record(v);
        }

        assert_eq!(hist.count(), 3);
        assert!((hist.mean() - 2.0).abs() < 0.001);
        assert!((hist.percentile(100.0) - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_histogram() {
        let hist = Histogram::new("empty");
        assert_eq!(hist.percentile(99.0), 0.0);
        assert_eq!(hist.summary().count, 0);
    }
}

//! Per-function message metrics

use adms_telemetry::{Counter, Histogram, HistogramSummary};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::functions::WorkerFunction;

#[derive(Clone)]
struct FunctionMetrics {
    processed: Counter,
    skipped: Counter,
    failed: Counter,
    latency_ms: Histogram,
}

impl FunctionMetrics {
    fn new(function: WorkerFunction) -> Self {
        let name = function.name();
        Self {
            processed: Counter::new(&format!("{}_processed", name)),
            skipped: Counter::new(&format!("{}_skipped", name)),
            failed: Counter::new(&format!("{}_failed", name)),
            latency_ms: Histogram::new(&format!("{}_latency_ms", name)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FunctionSnapshot {
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub latency_ms: HistogramSummary,
}

/// Counters for every worker function
#[derive(Clone)]
pub struct WorkerMetrics {
    functions: Arc<BTreeMap<&'static str, FunctionMetrics>>,
}

impl Default for WorkerMetrics {
    fn default() -> Self {
        let functions = WorkerFunction::ALL
            .iter()
            .map(|f| (f.name(), FunctionMetrics::new(*f)))
            .collect();
        Self {
            functions: Arc::new(functions),
        }
    }
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, function: WorkerFunction) -> Option<&FunctionMetrics> {
        self.functions.get(function.name())
    }

    pub fn record_processed(&self, function: WorkerFunction, elapsed_ms: f64) {
        if let Some(m) = self.get(function) {
            m.processed.inc();
            m.latency_ms.record(elapsed_ms);
        }
    }

    pub fn record_skipped(&self, function: WorkerFunction, elapsed_ms: f64) {
        if let Some(m) = self.get(function) {
            m.skipped.inc();
            m.latency_ms.record(elapsed_ms);
        }
    }

    pub fn record_failed(&self, function: WorkerFunction) {
        if let Some(m) = self.get(function) {
            m.failed.inc();
        }
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, FunctionSnapshot> {
        self.functions
            .iter()
            .map(|(name, m)| {
                (
                    *name,
                    FunctionSnapshot {
                        processed: m.processed.get(),
                        skipped: m.skipped.get(),
                        failed: m.failed.get(),
                        latency_ms: m.latency_ms.summary(),
                    },
                )
            })
            .collect()
    }
}

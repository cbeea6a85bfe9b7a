//! Report generation for benchmark results.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::histogram::LatencyHistogram;
use crate::error::Result;

/// Percentiles printed in every report, in order
pub const REPORTED_PERCENTILES: [f64; 6] = [50.0, 90.0, 99.0, 99.9, 99.99, 100.0];

/// Latency at each reported percentile, in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
    pub p99_9_ns: u64,
    pub p99_99_ns: u64,
    pub p100_ns: u64,
}

impl Percentiles {
    /// Query the reported percentiles; fails on an empty histogram
    pub fn from_histogram(histogram: &LatencyHistogram) -> Result<Self> {
        Ok(Self {
            p50_ns: histogram.value_at_percentile(50.0)?,
            p90_ns: histogram.value_at_percentile(90.0)?,
            p99_ns: histogram.value_at_percentile(99.0)?,
            p99_9_ns: histogram.value_at_percentile(99.9)?,
            p99_99_ns: histogram.value_at_percentile(99.99)?,
            p100_ns: histogram.value_at_percentile(100.0)?,
        })
    }

    /// `(percentile, nanoseconds)` pairs in report order
    pub fn entries(&self) -> [(f64, u64); 6] {
        let [p50, p90, p99, p99_9, p99_99, p100] = REPORTED_PERCENTILES;
        [
            (p50, self.p50_ns),
            (p90, self.p90_ns),
            (p99, self.p99_ns),
            (p99_9, self.p99_9_ns),
            (p99_99, self.p99_99_ns),
            (p100, self.p100_ns),
        ]
    }
}

/// Render the results table.
///
/// ```text
/// Results (n = 1000)
///
///    50.00%:      12.34 µs
///   ...
///   100.00%:      99.99 µs
///
/// ```
pub fn format_report(orders: u64, percentiles: &Percentiles) -> String {
    let mut out = String::with_capacity(256);
    // Writing to a String cannot fail
    let _ = writeln!(out, "Results (n = {})", orders);
    let _ = writeln!(out);
    for (percentile, ns) in percentiles.entries() {
        let _ = writeln!(out, "  {:>6.2}%: {:>10.2} µs", percentile, nanos_to_micros(ns));
    }
    let _ = writeln!(out);
    out
}

pub fn nanos_to_micros(ns: u64) -> f64 {
    ns as f64 / 1000.0
}

/// One percentile row of the JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub latency_us: f64,
}

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Orders per phase
    pub orders: u64,
    /// Samples in the measurement phase
    pub count: u64,
    pub percentiles: Percentiles,
    pub percentiles_us: Vec<PercentileValue>,
}

impl BenchmarkReport {
    pub fn new(orders: u64, count: u64, percentiles: Percentiles) -> Self {
        let percentiles_us = percentiles
            .entries()
            .iter()
            .map(|(percentile, ns)| PercentileValue {
                percentile: *percentile,
                latency_us: nanos_to_micros(*ns),
            })
            .collect();

        Self {
            orders,
            count,
            percentiles,
            percentiles_us,
        }
    }

    /// Text table, see [`format_report`]
    pub fn to_text(&self) -> String {
        format_report(self.orders, &self.percentiles)
    }

    /// Export the report as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

//! Latency recording using HdrHistogram for accurate percentile calculations.
//!
//! Recording is constant time and memory is proportional to
//! `log2(highest / lowest) * 10^significant_digits`, independent of how many
//! samples are recorded. Percentiles are reported at bucket precision: the
//! highest value equivalent to the bucket holding the requested rank.

use hdrhistogram::Histogram;

use super::config::{HistogramConfig, OverflowPolicy};
use crate::error::{BenchError, Result};

/// Histogram of round-trip latencies in nanoseconds
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    inner: Histogram<u64>,
    overflow: OverflowPolicy,
}

impl LatencyHistogram {
    pub fn new(config: &HistogramConfig) -> Result<Self> {
        let inner = Histogram::new_with_bounds(
            config.lowest_discernible_ns,
            config.highest_trackable_ns,
            config.significant_digits,
        )
        .map_err(|e| BenchError::Histogram(e.to_string()))?;

        Ok(Self {
            inner,
            overflow: config.overflow,
        })
    }

    /// Record one latency sample
    pub fn record(&mut self, latency_ns: u64) -> Result<()> {
        match self.overflow {
            OverflowPolicy::Clamp => {
                self.inner.saturating_record(latency_ns);
                Ok(())
            }
            OverflowPolicy::Fail => {
                self.inner
                    .record(latency_ns)
                    .map_err(|_| BenchError::LatencyOutOfRange {
                        value: latency_ns,
                        max: self.inner.high(),
                    })
            }
        }
    }

    /// Smallest bucket value at or below which `percentile`% of samples fall.
    ///
    /// `percentile` is in (0, 100]. Fails when nothing has been recorded
    /// since the last reset.
    pub fn value_at_percentile(&self, percentile: f64) -> Result<u64> {
        debug_assert!(percentile > 0.0 && percentile <= 100.0);
        if self.inner.is_empty() {
            return Err(BenchError::EmptyHistogram);
        }
        Ok(self.inner.value_at_percentile(percentile))
    }

    /// Zero every count, keeping bounds and precision
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Samples recorded since the last reset
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn highest_trackable(&self) -> u64 {
        self.inner.high()
    }

    pub fn significant_digits(&self) -> u8 {
        self.inner.sigfig()
    }
}

//! Configuration structs for benchmarking.

use serde::{Deserialize, Serialize};

/// What to do with a latency above the histogram's trackable maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Record it as the maximum trackable value
    #[default]
    Clamp,
    /// Abort the run
    Fail,
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverflowPolicy::Clamp => write!(f, "clamp"),
            OverflowPolicy::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clamp" => Ok(OverflowPolicy::Clamp),
            "fail" => Ok(OverflowPolicy::Fail),
            _ => Err(format!("Unknown overflow policy: {}", s)),
        }
    }
}

/// Bounds and precision of the latency histogram
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramConfig {
    /// Smallest distinguishable latency in nanoseconds
    pub lowest_discernible_ns: u64,
    /// Largest trackable latency in nanoseconds
    pub highest_trackable_ns: u64,
    /// Significant decimal digits kept for every value (1 to 5)
    pub significant_digits: u8,
    pub overflow: OverflowPolicy,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            lowest_discernible_ns: 1,
            // One minute
            highest_trackable_ns: 60_000_000_000,
            significant_digits: 3,
            overflow: OverflowPolicy::Clamp,
        }
    }
}

/// Configuration for a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Orders per phase; warmup and measurement each send this many
    pub orders: u64,
    pub histogram: HistogramConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            orders: 10_000,
            histogram: HistogramConfig::default(),
        }
    }
}

/// Configuration for the mock acceptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockAcceptorConfig {
    /// Port to listen on (0 for random)
    pub port: u16,
    /// Fixed delay before each execution report, in microseconds
    pub response_delay_us: u64,
    /// Extra uniformly random delay added to the fixed one, in microseconds
    pub response_jitter_us: u64,
    pub sender_comp_id: String,
}

impl Default for MockAcceptorConfig {
    fn default() -> Self {
        Self {
            port: 0,
            response_delay_us: 0,
            response_jitter_us: 0,
            sender_comp_id: "acceptor".to_string(),
        }
    }
}

//! Benchmark module for order-entry round-trip latency.
//!
//! This module provides:
//! - The benchmark driver (warmup, reset, measurement)
//! - The reusable order template
//! - HdrHistogram-based latency recording
//! - Report generation
//! - A mock FIX acceptor for tests and standalone runs

pub mod config;
pub mod histogram;
pub mod mock_acceptor;
pub mod report;
pub mod runner;
pub mod template;

pub use config::{BenchmarkConfig, HistogramConfig, MockAcceptorConfig, OverflowPolicy};
pub use histogram::LatencyHistogram;
pub use mock_acceptor::MockAcceptor;
pub use report::{format_report, BenchmarkReport, Percentiles};
pub use runner::BenchmarkDriver;
pub use template::OrderTemplate;

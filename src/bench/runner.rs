//! Benchmark driver: warmup, reset, measurement, report.

use std::io::Write;
use tracing::{debug, info};

use super::config::BenchmarkConfig;
use super::histogram::LatencyHistogram;
use super::report::{BenchmarkReport, Percentiles};
use super::template::OrderTemplate;
use crate::error::Result;
use crate::transport::Transport;

/// Runs strictly paired send/receive round trips over one transport
pub struct BenchmarkDriver<T: Transport> {
    transport: T,
    histogram: LatencyHistogram,
    orders: u64,
    next_cl_ord_id: u64,
}

impl<T: Transport> BenchmarkDriver<T> {
    /// Create a driver over an already opened transport
    pub fn new(transport: T, config: &BenchmarkConfig) -> Result<Self> {
        Ok(Self {
            transport,
            histogram: LatencyHistogram::new(&config.histogram)?,
            orders: config.orders,
            next_cl_ord_id: 1,
        })
    }

    /// Run both phases, close the transport and build the report.
    ///
    /// Phase banners go to `out`. Any transport error aborts the run; no
    /// report is produced for a partial run.
    pub fn run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<BenchmarkReport> {
        let mut template = OrderTemplate::build(&self.transport);

        writeln!(out, "Warming up...")?;
        info!(orders = self.orders, "Warmup phase");
        for _ in 0..self.orders {
            self.round_trip(&mut template)?;
        }

        // Warmup timings are never recorded; measure from an empty histogram
        self.histogram.reset();

        writeln!(out, "Benchmarking...")?;
        info!(orders = self.orders, "Measurement phase");
        for _ in 0..self.orders {
            let latency_ns = self.round_trip(&mut template)?;
            self.histogram.record(latency_ns)?;
        }

        self.transport.close()?;

        let percentiles = Percentiles::from_histogram(&self.histogram)?;
        debug!(?percentiles, "Measurement complete");
        Ok(BenchmarkReport::new(
            self.orders,
            self.histogram.len(),
            percentiles,
        ))
    }

    /// One order: stamp the next ClOrdID, send, block for the reply.
    ///
    /// Returns the elapsed nanoseconds. The clock is read after the template
    /// is updated and after the reply is fully decoded.
    fn round_trip(&mut self, template: &mut OrderTemplate) -> Result<u64> {
        let id = self.next_order_id();
        template.set_cl_ord_id(id);

        let start = self.transport.now_nanos();
        self.transport.send(template.message())?;
        self.transport.receive()?;
        let end = self.transport.now_nanos();

        Ok(end.saturating_sub(start))
    }

    fn next_order_id(&mut self) -> u64 {
        let id = self.next_cl_ord_id;
        self.next_cl_ord_id += 1;
        id
    }

    pub fn histogram(&self) -> &LatencyHistogram {
        &self.histogram
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

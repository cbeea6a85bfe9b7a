use clap::Parser;
use std::ffi::OsString;
use std::time::Duration;

use crate::bench::{BenchmarkConfig, HistogramConfig, OverflowPolicy};
use crate::fix::SessionConfig;

/// Round-trip latency benchmark for a FIX 4.2 order-entry session
#[derive(Parser, Debug)]
#[command(name = "order-entry-bench", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Counterpart host name or address
    pub host: String,

    /// Counterpart TCP port
    pub port: u16,

    /// Orders per phase (warmup and measurement each send this many)
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub orders: u64,

    /// SenderCompID (49) on outbound messages
    #[arg(long, env = "SENDER_COMP_ID", default_value = "initiator")]
    pub sender_comp_id: String,

    /// TargetCompID (56) on outbound messages
    #[arg(long, env = "TARGET_COMP_ID", default_value = "acceptor")]
    pub target_comp_id: String,

    /// Heartbeat interval in seconds (0 disables heartbeats)
    #[arg(long, env = "HEARTBEAT_INTERVAL", default_value = "30")]
    pub heartbeat_interval: u64,

    /// Largest latency the histogram tracks, in nanoseconds
    #[arg(
        long,
        env = "MAX_LATENCY_NS",
        default_value = "60000000000",
        value_parser = clap::value_parser!(u64).range(2..)
    )]
    pub max_latency_ns: u64,

    /// Significant digits kept by the histogram
    #[arg(
        long,
        env = "SIGNIFICANT_DIGITS",
        default_value = "3",
        value_parser = clap::value_parser!(u8).range(1..=5)
    )]
    pub significant_digits: u8,

    /// Latencies above --max-latency-ns: clamp or fail
    #[arg(long, env = "ON_OVERFLOW", default_value = "clamp")]
    pub on_overflow: OverflowPolicy,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub session: SessionConfig,
    pub benchmark: BenchmarkConfig,

    // Output
    pub json: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl Config {
    /// Parse an argument list with priority CLI > ENV > defaults.
    ///
    /// The first item is the program name. Callers load `.env` beforehand.
    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = CliArgs::try_parse_from(args)?;
        Ok(Self::from(args))
    }
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        Config {
            session: SessionConfig {
                host: args.host,
                port: args.port,
                sender_comp_id: args.sender_comp_id,
                target_comp_id: args.target_comp_id,
                heartbeat_interval: Duration::from_secs(args.heartbeat_interval),
            },
            benchmark: BenchmarkConfig {
                orders: args.orders,
                histogram: HistogramConfig {
                    highest_trackable_ns: args.max_latency_ns,
                    significant_digits: args.significant_digits,
                    overflow: args.on_overflow,
                    ..Default::default()
                },
            },
            json: args.json,
            log_level: args.log_level,
            log_json: args.log_json,
        }
    }
}

//! Process-level flow: parse arguments, open the session, run, report.
//!
//! Kept free of process globals so usage and fatal paths are testable with
//! injected writers and transports.

use anyhow::Context;
use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use crate::bench::BenchmarkDriver;
use crate::config::Config;
use crate::error::Result;
use crate::fix::SessionConfig;
use crate::transport::Transport;

pub const USAGE: &str = "Usage: order-entry-bench <host> <port> <orders>";

/// How the process ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Report printed
    Success,
    /// Fatal runtime error
    Fatal,
    /// Malformed command line
    Usage,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Fatal => 1,
            Outcome::Usage => 2,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

/// Parse arguments, writing help/version to `out` and usage errors to `err`
pub fn parse<I, T, O, E>(args: I, out: &mut O, err: &mut E) -> std::result::Result<Config, Outcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    O: Write + ?Sized,
    E: Write + ?Sized,
{
    Config::try_from_args(args).map_err(|e| usage(&e, out, err))
}

fn usage<O: Write + ?Sized, E: Write + ?Sized>(
    e: &clap::Error,
    out: &mut O,
    err: &mut E,
) -> Outcome {
    use clap::error::ErrorKind;

    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(out, "{}", e.render());
            Outcome::Success
        }
        _ => {
            let rendered = e.render().to_string();
            let detail = rendered.lines().next().unwrap_or_default();
            let _ = writeln!(err, "{}", USAGE);
            let _ = writeln!(err, "{}", detail);
            Outcome::Usage
        }
    }
}

/// Open a transport with `open`, run the benchmark and print the report.
///
/// The report is written only after both phases and the session teardown
/// succeed.
pub fn execute<F, T, O, E>(config: &Config, open: F, out: &mut O, err: &mut E) -> Outcome
where
    F: FnOnce(&SessionConfig) -> Result<T>,
    T: Transport,
    O: Write + ?Sized,
    E: Write + ?Sized,
{
    match try_execute(config, open, out) {
        Ok(()) => Outcome::Success,
        Err(e) => {
            tracing::error!("Benchmark failed: {:#}", e);
            fatal(&e, err);
            Outcome::Fatal
        }
    }
}

/// Parse then execute
pub fn run<I, S, F, T, O, E>(args: I, open: F, out: &mut O, err: &mut E) -> Outcome
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    F: FnOnce(&SessionConfig) -> Result<T>,
    T: Transport,
    O: Write + ?Sized,
    E: Write + ?Sized,
{
    match parse(args, out, err) {
        Ok(config) => execute(&config, open, out, err),
        Err(outcome) => outcome,
    }
}

fn try_execute<F, T, O>(config: &Config, open: F, out: &mut O) -> anyhow::Result<()>
where
    F: FnOnce(&SessionConfig) -> Result<T>,
    T: Transport,
    O: Write + ?Sized,
{
    let transport = open(&config.session)
        .with_context(|| format!("Cannot open session to {}", config.session.address()))?;

    let mut driver = BenchmarkDriver::new(transport, &config.benchmark)?;
    let report = driver.run(out).context("Benchmark aborted")?;

    if config.json {
        writeln!(out, "{}", report.to_json())?;
    } else {
        write!(out, "{}", report.to_text())?;
    }
    out.flush()?;
    Ok(())
}

fn fatal<E: Write + ?Sized>(e: &anyhow::Error, err: &mut E) {
    let _ = writeln!(err, "fatal: {:#}", e);
    let _ = writeln!(err);
    let _ = writeln!(err, "{:?}", e);
    let _ = writeln!(err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::transport::stub::StubTransport;

    fn run_with<F>(args: &[&str], open: F) -> (Outcome, String, String)
    where
        F: FnOnce(&SessionConfig) -> Result<StubTransport>,
    {
        let mut argv = vec!["order-entry-bench"];
        argv.extend_from_slice(args);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = run(argv, open, &mut out, &mut err);
        (
            outcome,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn refuse(config: &SessionConfig) -> Result<StubTransport> {
        Err(BenchError::Connect {
            addr: config.address(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        })
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Success.code(), 0);
        assert_eq!(Outcome::Fatal.code(), 1);
        assert_eq!(Outcome::Usage.code(), 2);
    }

    #[test]
    fn test_two_arguments_is_usage_error() {
        let (outcome, out, err) = run_with(&["localhost", "4000"], |_| {
            Ok(StubTransport::constant(1_000))
        });

        assert_eq!(outcome, Outcome::Usage);
        assert!(out.is_empty());
        assert!(err.starts_with(USAGE));
    }

    #[test]
    fn test_non_numeric_port_is_usage_error() {
        let (outcome, out, err) = run_with(&["localhost", "port", "10"], |_| {
            Ok(StubTransport::constant(1_000))
        });

        assert_eq!(outcome, Outcome::Usage);
        assert!(out.is_empty());
        assert!(err.contains("port"));
    }

    #[test]
    fn test_help_goes_to_stdout() {
        let (outcome, out, err) = run_with(&["--help"], |_| Ok(StubTransport::constant(1)));
        assert_eq!(outcome, Outcome::Success);
        assert!(out.contains("<HOST>"));
        assert!(err.is_empty());
    }

    #[test]
    fn test_open_failure_is_fatal() {
        let (outcome, out, err) = run_with(&["localhost", "4000", "10"], refuse);

        assert_eq!(outcome, Outcome::Fatal);
        assert!(!out.contains("Results"));
        assert!(err.starts_with("fatal: Cannot open session to localhost:4000"));
        assert!(err.contains("refused"));
    }

    #[test]
    fn test_transport_failure_mid_run_is_fatal() {
        let (outcome, out, err) = run_with(&["localhost", "4000", "10"], |_| {
            Ok(StubTransport::constant(1_000).failing_on_send(3))
        });

        assert_eq!(outcome, Outcome::Fatal);
        assert_eq!(out, "Warming up...\n");
        assert!(err.contains("Benchmark aborted"));
    }

    #[test]
    fn test_successful_run_prints_report() {
        let (outcome, out, err) = run_with(&["localhost", "4000", "100"], |config| {
            assert_eq!(config.port, 4000);
            Ok(StubTransport::constant(25_000))
        });

        assert_eq!(outcome, Outcome::Success);
        assert!(err.is_empty());
        assert!(out.starts_with("Warming up...\nBenchmarking...\nResults (n = 100)\n\n"));
        assert_eq!(out.lines().filter(|l| l.ends_with(" µs")).count(), 6);
        assert!(out.contains("  100.00%:"));
    }

    #[test]
    fn test_json_report() {
        let (outcome, out, _) = run_with(&["localhost", "4000", "10", "--json"], |_| {
            Ok(StubTransport::constant(25_000))
        });

        assert_eq!(outcome, Outcome::Success);
        let json_start = out.find('{').unwrap();
        let json: serde_json::Value = serde_json::from_str(&out[json_start..]).unwrap();
        assert_eq!(json["orders"], 10);
        assert_eq!(json["count"], 10);
    }
}

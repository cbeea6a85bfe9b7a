use std::io;
use std::process::ExitCode;

use order_entry_bench::{app, config::Config, fix::FixSession};

fn main() -> ExitCode {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let config = match app::parse(std::env::args_os(), &mut out, &mut err) {
        Ok(config) => config,
        Err(outcome) => return outcome.into(),
    };

    init_logging(&config);
    tracing::info!(
        "Benchmarking {} with {} orders per phase",
        config.session.address(),
        config.benchmark.orders
    );

    app::execute(&config, FixSession::open, &mut out, &mut err).into()
}

/// Initialize logging on stderr so stdout carries only the report
fn init_logging(config: &Config) {
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    if config.log_json {
        builder.json().init();
    } else {
        builder.with_file(true).with_line_number(true).init();
    }
}

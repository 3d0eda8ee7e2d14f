//! Tracing setup for the CLI.
//!
//! - `DRILL_LOG` sets the filter (e.g. "debug" or "drill=debug"), default "warn".
//! - `DRILL_LOG_FORMAT=json` switches to structured JSON lines.
//!
//! Logs go to stderr; stdout carries command results only.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("DRILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match std::env::var("DRILL_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

//! Logging setup
//!
//! Headless commands log to stderr. The panel routes log records into the
//! console instead, so they never draw over the terminal UI.
//! Only the first subscriber installed in a process takes effect.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use twirtee_foundation::{OutputSink, SinkWriter};

fn filter(debug: bool) -> EnvFilter {
    let log_level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Log to stderr
pub fn init_stderr(debug: bool) {
    tracing_subscriber::registry()
        .with(filter(debug))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}

/// Log into the console through `sink`
pub fn init_console(debug: bool, sink: Arc<dyn OutputSink>) {
    tracing_subscriber::registry()
        .with(filter(debug))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .without_time()
                .with_writer(move || SinkWriter::new(Arc::clone(&sink))),
        )
        .try_init()
        .ok();

    // a panic message on stderr would land in the middle of the UI
    std::panic::set_hook(Box::new(|info| {
        let thread = std::thread::current();
        tracing::error!(
            "thread '{}' {}",
            thread.name().unwrap_or("<unnamed>"),
            info
        );
    }));
}

use std::io;

use tracing_appender::rolling;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Initialize the process-wide tracing subscriber.
/// - Respects `RUST_LOG` if set, otherwise uses `default_level`
/// - Compact console output on stdout
/// - `error.log` receives error-level events only
/// - `combined.log` receives everything as JSON for ingestion
pub fn init_logging(default_level: &str, log_dir: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{default_level},tower_http=info,axum=info"))
    });

    // The appender panics on a missing directory
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: cannot create log directory {log_dir}: {e}");
    }

    let combined = rolling::never(log_dir, "combined.log");
    let errors = rolling::never(log_dir, "error.log");

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(io::stdout),
        )
        .with(fmt::layer().json().with_writer(combined))
        .with(
            fmt::layer()
                .json()
                .with_writer(errors)
                .with_filter(LevelFilter::ERROR),
        )
        .try_init();

    install_panic_hook();
}

/// Route panics through the subscriber so nothing dies silently.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(event = "panic", message = %info, "unhandled panic occurred");
    }));
}

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Builds the filter: `RUST_LOG` directives when given, otherwise
/// `default_level` with this crate and request tracing raised to debug when
/// `verbose`.
fn log_filter(rust_log: Option<&str>, verbose: bool, default_level: LevelFilter) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::new(directives);
    }

    let app_level = if verbose {
        LevelFilter::DEBUG
    } else {
        default_level
    };
    EnvFilter::new(format!(
        "{default_level},pesofolio={app_level},tower_http={app_level}"
    ))
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over both
/// `verbose` and `default_level`.
pub fn init_logging(verbose: bool, default_level: LevelFilter) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(fmt::layer().without_time())
        .with(log_filter(rust_log.as_deref(), verbose, default_level))
        .init();
}

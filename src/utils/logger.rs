//! Logging utilities
//!
//! Builds the `tracing` subscriber filter from `--verbose`, the configured
//! log level, and `RUST_LOG`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Resolve the effective level: `--verbose` wins, then the configured name
    pub fn resolve(verbose: bool, configured: &str) -> Self {
        if verbose {
            LogLevel::Debug
        } else {
            LogLevel::from_str(configured).unwrap_or(LogLevel::Info)
        }
    }
}

fn crate_directive(level: LogLevel) -> String {
    format!("feature_runner={}", level.to_tracing_level())
}

/// Filter directives for the subscriber.
///
/// `--verbose` wins. A configured value holding `target=level` directives is
/// used as-is, then a non-empty `RUST_LOG`, then the configured level
/// applied to this crate.
pub fn filter_directives(verbose: bool, configured: &str, rust_log: Option<&str>) -> String {
    if verbose {
        return crate_directive(LogLevel::Debug);
    }

    let configured = configured.trim();
    if configured.contains('=') && EnvFilter::try_new(configured).is_ok() {
        return configured.to_string();
    }

    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() && EnvFilter::try_new(directives).is_ok() => {
            directives.to_string()
        }
        _ => crate_directive(LogLevel::resolve(false, configured)),
    }
}

/// Initialize the global subscriber
pub fn init_logger(verbose: bool, configured: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(verbose, configured, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new(crate_directive(LogLevel::Info)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

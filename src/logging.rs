//! Structured logging seam (§6). The engine never calls `tracing` directly from the
//! wipe path -- it emits through [`LogSink`] so an embedder (a GUI pane, a test harness
//! capturing events) can swap in something other than the default `tracing` forwarder.

use std::fmt;

/// Severity of a logged event. `Notice` and `Sanity` have no native `tracing::Level`
/// equivalent, so the default sink maps them onto `info`/`warn` with a boolean field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    /// A normal but noteworthy event (e.g. a device finished successfully).
    Notice,
    Warning,
    Error,
    /// Unrecoverable: the process is about to abort.
    Fatal,
    /// A self-test or invariant check passed/failed (entropy gate, HPA reconciliation).
    Sanity,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Sanity => "sanity",
        };
        f.write_str(s)
    }
}

/// Anything that can receive `(level, message)` events from the engine.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }
    fn notice(&self, message: &str) {
        self.log(LogLevel::Notice, message);
    }
    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
    fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }
    fn sanity(&self, message: &str) {
        self.log(LogLevel::Sanity, message);
    }
}

/// Forwards every event to `tracing`. `Notice` and `Sanity` carry a boolean field since
/// `tracing::Level` has no matching variant for either.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Notice => tracing::info!(notice = true, "{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Fatal => tracing::error!(fatal = true, "{message}"),
            LogLevel::Sanity => tracing::warn!(sanity = true, "{message}"),
        }
    }
}

/// Installs the process-wide `tracing` subscriber. Call once from `main`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .finish();
    // A second call (e.g. from a test harness that already installed a subscriber) is
    // harmless -- we just keep the first one.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

//! Logging service

use crate::models::LogLevel;
use tracing::Span;
use tracing_subscriber::EnvFilter;

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Build the filter for the given level. `RUST_LOG`, when set, wins.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    let directive = level_directive(level);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "resumestate={directive},resumestate_core={directive}"
        ))
    })
}

/// Initialize logging with the specified level.
///
/// Lines go to stderr with thread names; stdout is left to command output.
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
}

/// Root span tagging every line of a run with the deployment environment
pub fn environment_span(environment_tag: &str) -> Span {
    tracing::info_span!("resumestate", env = environment_tag)
}

/// Messages of the errors below `error` in its source chain, outermost first
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

/// Log a fatal error together with its source chain
pub fn log_failure(error: &(dyn std::error::Error + 'static)) {
    tracing::error!(
        error = %error,
        caused_by = error_chain(error).join(": "),
        "Recovery run failed"
    );
}

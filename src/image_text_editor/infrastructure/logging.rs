use tracing_subscriber::{fmt, EnvFilter};

/// Quiet dependencies unless asked otherwise; the editor itself logs at `level`.
const DEPENDENCY_LEVEL: &str = "warn";

/// Filter used when `RUST_LOG` is unset. A bare level such as `debug` only
/// applies to this crate. Anything that already looks like a directive list is
/// taken as-is.
pub fn default_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains(['=', ',']) {
        return level.to_string();
    }
    format!("{},{}={}", DEPENDENCY_LEVEL, env!("CARGO_CRATE_NAME"), level)
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let builder = fmt().with_env_filter(env_filter).with_target(true);

    let installed = if json { builder.json().try_init() } else { builder.try_init() };
    if let Err(e) = installed {
        // A subscriber was already set, e.g. by a test harness
        tracing::debug!(error = %e, "Logging already initialised");
    }
}

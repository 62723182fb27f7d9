use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "TURBO_ERASER_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global fmt subscriber. Safe to call more than once.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging to stderr.
///
/// The filter comes from `BF_LOG`, then `RUST_LOG`, and defaults to `warn` so
/// stdout carries nothing but program output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("BF_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

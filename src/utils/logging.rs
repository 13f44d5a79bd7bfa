use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber for the transport.
///
/// `default_level` is the `logging.level` value from the settings and acts
/// as the baseline filter; a `RUST_LOG` directive in the environment takes
/// precedence so individual targets can be tuned without editing the
/// configuration file.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // try_init so tests can call this more than once without panicking
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

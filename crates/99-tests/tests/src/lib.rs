//! Cross-crate test suite for the message codec workspace.

#[cfg(test)]
mod codec_e2e;

#[cfg(test)]
mod dump_e2e;

#[cfg(test)]
mod properties;

/// Installs the fixture required-field table and routes diagnostics to the
/// test harness, filtered by `RUST_LOG` (default `warn`).
#[cfg(test)]
fn setup() {
    use tracing_subscriber::{fmt, EnvFilter};

    testdata::init();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Ignore error if another test installed it first.
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

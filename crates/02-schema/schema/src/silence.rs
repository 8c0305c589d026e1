//! Scoped suppression of decoder log output.
//!
//! Decoding untrusted or evolving input fails routinely, and those failures are
//! reported through return values. A [`LogSilencer`] swaps the current thread's
//! `tracing` dispatcher for one that discards everything, and puts the previous
//! dispatcher back when it is dropped, on every exit path including unwinding.

use tracing::subscriber::{DefaultGuard, NoSubscriber};

/// Guard that silences `tracing` output on the current thread while it lives.
#[must_use = "logging is restored as soon as the silencer is dropped"]
pub struct LogSilencer {
    _guard: DefaultGuard,
}

impl LogSilencer {
    pub fn new() -> Self {
        Self {
            _guard: tracing::subscriber::set_default(NoSubscriber::default()),
        }
    }
}

impl Default for LogSilencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` with logging silenced.
pub fn silenced<R>(f: impl FnOnce() -> R) -> R {
    let _silencer = LogSilencer::new();
    f()
}

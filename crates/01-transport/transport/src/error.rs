//! Error handling helpers for the transport crate.
//!
//! The transport layer keeps its error surface small: the only runtime failure
//! a buffer can report is a header reservation that does not fit its contents.

use thiserror::Error;

/// Convenience result alias for fallible transport operations.
pub type TransportResult<T, E = TransportError> = Result<T, E>;

/// Errors surfaced by low-level transport helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// A header reservation of `requested` bytes exceeds the `length` bytes held by the buffer.
    #[error("header reservation of {requested} bytes exceeds buffer length {length}")]
    HeaderOutOfBounds { requested: usize, length: usize },
}

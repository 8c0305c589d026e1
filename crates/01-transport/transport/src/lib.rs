//! Core transport primitives shared by the codec and the RPC layer.
//!
//! This crate exposes the byte-level pieces the message codec writes into:
//! * [`Buffer`] – an owned, contiguous byte region with a pluggable release strategy.
//! * [`Release`] – how a buffer gives its backing array back when replaced or dropped.
//! * [`TransportError`] – lightweight error surface for header/payload bounds failures.

mod buffer;
mod error;

pub use buffer::{Buffer, Release};
pub use error::{TransportError, TransportResult};

//! Protobuf text format: printing and parsing.

mod escape;
mod parser;
mod printer;

pub use escape::{escape_bytes, escape_str, unescape};
pub use parser::{parse_text, TextError};
pub use printer::Printer;

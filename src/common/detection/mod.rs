//! Input format detection.
//!
//! Classifies a raw byte buffer by magic-byte signatures before any parsing
//! is attempted. Pure functions, no side effects, no retries.

mod functions;
mod types;

pub use functions::{detect_format, is_html_text, is_legacy_binary, is_zip_container};
pub use types::SourceFormat;

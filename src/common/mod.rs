//! Shared infrastructure used across the import and export pipelines.

pub mod detection;
pub mod diagnostics;
pub mod error;
pub mod units;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};

//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Diagnostics and structured warning reporting
//! - Error types and result types
//! - Small text helpers (whitespace, edit distance, paren-aware splitting)

pub mod diagnostics;
pub mod error;
pub mod text;

// Re-export commonly used items
pub use diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticSink};
pub use error::{ConfigError, ConfigResult};

//! # flexion
//!
//! Inflection table interpretation engine for wiki-style dictionary tables.
//!
//! ## Features
//!
//! - **Grid Expansion**: Resolves rowspan/colspan markup into a dense cell grid
//! - **Header Classification**: Maps header text to morphological tags via a
//!   longest-match rule table with language/part-of-speech conditions
//! - **Span Tracking**: Column and row header spans combine into per-cell tag sets
//! - **Form Extraction**: Splits data cells into alternatives, romanizations,
//!   and IPA transcriptions
//! - **Footnote Decoding**: Table footnotes become extra tags on referencing forms
//! - **Language Policies**: Per-language tweaks (article folding, concord
//!   replacements, placeholder handling) without forking the core scan
//! - **Structured Diagnostics**: Every degraded decision is reported, never panicked
//!
//! ## Usage Examples
//!
//! ### Scanning a Small Table
//!
//! ```rust
//! use flexion::{extract_forms, Engine, RawCell, RawRow, ScanOptions, TableNode};
//!
//! let table = TableNode::new(vec![
//!     RawRow::new(vec![RawCell::header("singular"), RawCell::header("plural")]),
//!     RawRow::new(vec![RawCell::data("kissa"), RawCell::data("kissat")]),
//! ]);
//!
//! let engine = Engine::new();
//! let out = extract_forms(&engine, &table, &ScanOptions::new("kissa", "Finnish", "noun"));
//!
//! assert!(out
//!     .forms
//!     .iter()
//!     .any(|f| f.form == "kissat" && f.tags == ["plural"]));
//! ```
//!
//! ### Customizing the Rule Table
//!
//! ```rust
//! use flexion::{extract_forms, Engine, RawCell, RawRow, RuleNode, ScanOptions, TableNode};
//!
//! let mut engine = Engine::new();
//! engine
//!     .rules_mut()
//!     .insert("colloquial forms", RuleNode::literal("colloquial"));
//!
//! let table = TableNode::new(vec![RawRow::new(vec![
//!     RawCell::header("colloquial forms"),
//!     RawCell::data("laulan"),
//! ])]);
//!
//! let out = extract_forms(&engine, &table, &ScanOptions::new("laulaa", "Finnish", "verb"));
//! assert!(out.forms.iter().any(|f| f.tags.contains(&"colloquial".to_string())));
//! ```

/// Core engine modules
pub mod core;

/// Data layer - tag vocabulary, language policies, and built-in rules
pub mod data;

/// Feature modules - cell cleanup, form splitting, and title parsing
pub mod features;

/// Utility modules
pub mod utils;

// Re-export the scanning entry point and its types
pub use core::driver::{extract_forms, Engine, FormRecord, ScanOptions, ScanOutput, TableContext};

// Re-export table input and grid types
pub use core::grid::{build_grids, CellGrid, RawCell, RawRow, TableNode};

// Re-export rule table types for customization
pub use core::rules::{Decision, IfTags, ResolveCtx, ResolveOpts, RuleNode, RuleTable};
pub use core::spans::{compute_cell_tags, HeaderSpan};
pub use core::tagset::{TagCombo, Tagset};

// Re-export data modules
pub use data::policies::{LangPolicy, PolicyRegistry, SpanReuse};
pub use data::rules_builtin::builtin_rules;
pub use data::tags::{TagCategory, TagVocab};

// Re-export utilities
pub use utils::diagnostics;
pub use utils::diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticSink};
pub use utils::error::{ConfigError, ConfigResult};

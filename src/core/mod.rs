//! Core engine: grid construction, header classification, span tracking,
//! tagset algebra, rule resolution, and the scanning driver

pub mod driver;
pub mod grid;
pub mod header;
pub mod rules;
pub mod spans;
pub mod tagset;

// Re-export commonly used items
pub use driver::{extract_forms, Engine, FormRecord, ScanOptions, ScanOutput, TableContext};
pub use grid::{build_grids, CellGrid, RawCell, RawRow, TableNode};
pub use rules::{Decision, IfTags, ResolveCtx, ResolveOpts, RuleNode, RuleTable};
pub use spans::{compute_cell_tags, HeaderSpan};
pub use tagset::{Tagset, TagCombo};

//! Text-level interpretation features: cell cleanup, form splitting, and
//! table title parsing.

pub mod cellclean;
pub mod split;
pub mod title;

pub use cellclean::{extract_cell_content, CellContent};
pub use split::{
    classify_text, regroup_mixed_lines, split_into_alternatives, TextKind,
};
pub use title::{parse_title, TitleContribution};

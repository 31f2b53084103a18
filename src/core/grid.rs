//! Cell grid construction
//!
//! Turns the row/cell tree produced by an external wikitext processor into
//! rectangular grids of cells. Column spans repeat the same cell id across
//! the spanned columns; row spans carry the cell down via per-column gap
//! state. Cell identity is the arena index, so "same cell" checks are
//! integer comparisons regardless of text equality.
//!
//! A table containing nested sub-tables is split into segments: the rows
//! before the nesting point form one grid, the nested tables follow as
//! their own grids (inheriting the titles collected so far plus any text
//! around the nesting cell), and the remaining rows form another grid.

use crate::utils::text::is_superscript;

/// Whether the source markup declared the cell as a header or data cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Header,
    Data,
}

/// A cell as delivered by the wikitext processor: already cleaned text,
/// span attributes, and style information.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "data-loading",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RawCell {
    pub text: String,
    pub header: bool,
    pub rowspan: u32,
    pub colspan: u32,
    pub style: String,
    pub class: String,
    /// Sub-tables found inside this cell
    pub nested: Vec<TableNode>,
}

impl RawCell {
    pub fn data(text: &str) -> Self {
        Self {
            text: text.to_string(),
            header: false,
            rowspan: 1,
            colspan: 1,
            ..Self::default()
        }
    }

    pub fn header(text: &str) -> Self {
        Self {
            header: true,
            ..Self::data(text)
        }
    }

    pub fn spanning(mut self, rowspan: u32, colspan: u32) -> Self {
        self.rowspan = rowspan.max(1);
        self.colspan = colspan.max(1);
        self
    }

    pub fn styled(mut self, style: &str, class: &str) -> Self {
        self.style = style.to_string();
        self.class = class.to_string();
        self
    }

    pub fn with_nested(mut self, nested: TableNode) -> Self {
        self.nested.push(nested);
        self
    }

    fn style_signature(&self) -> String {
        let kind = if self.header { "th" } else { "td" };
        format!("{}//{}//{}", self.style, self.class, kind)
    }
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "data-loading",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(cells: Vec<RawCell>) -> Self {
        Self { cells }
    }
}

/// One table as delivered by the wikitext processor.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "data-loading",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TableNode {
    pub rows: Vec<RawRow>,
}

impl TableNode {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }
}

/// Stable identity of a cell within one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(u32);

/// A materialized cell.
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub kind: CellKind,
    pub rowspan: u32,
    pub colspan: u32,
    /// style//class//kind signature used by header detection
    pub style: String,
}

impl Cell {
    pub fn is_header(&self) -> bool {
        self.kind == CellKind::Header
    }

    /// Cell text with trailing footnote reference markers removed.
    pub fn text_without_refs(&self) -> &str {
        let mut text = self.text.trim_end();
        while let Some(last) = text.chars().last() {
            if is_superscript(last) {
                text = text[..text.len() - last.len_utf8()].trim_end();
            } else {
                break;
            }
        }
        text
    }
}

/// A rectangular grid of cells with spans materialized.
#[derive(Debug, Clone, Default)]
pub struct CellGrid {
    cells: Vec<Cell>,
    pub rows: Vec<Vec<CellId>>,
    /// Titles inherited from captions and enclosing cells
    pub titles: Vec<String>,
    /// Table nesting depth, 0 for top level
    pub depth: usize,
}

impl CellGrid {
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0 as usize]
    }

    fn push_cell(&mut self, cell: Cell) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(cell);
        id
    }
}

// Header texts that stack two category labels in one cell with a line
// break instead of using rowspan.
static STACKED_HEADER_TEXTS: &[&str] = &["inanimate\nanimate", "animate\ninanimate"];

// Per-column state carrying a rowspan cell into later rows.
struct FillSlot {
    proto: Cell,
    remaining: u32,
    // Source cell this slot continues; sibling columns of one spanning
    // cell share the same origin
    origin: u32,
    // Cell id valid within the segment currently being built
    current_id: Option<CellId>,
}

struct GridBuilder {
    output: Vec<CellGrid>,
    current: CellGrid,
    fill: Vec<FillSlot>,
    next_origin: u32,
}

impl GridBuilder {
    fn new(titles: Vec<String>, depth: usize) -> Self {
        Self {
            output: Vec::new(),
            current: CellGrid {
                titles,
                depth,
                ..CellGrid::default()
            },
            fill: Vec::new(),
            next_origin: 0,
        }
    }

    fn flush_segment(&mut self) {
        if self.current.rows.is_empty() {
            return;
        }
        let titles = self.current.titles.clone();
        let depth = self.current.depth;
        let segment = std::mem::replace(
            &mut self.current,
            CellGrid {
                titles,
                depth,
                ..CellGrid::default()
            },
        );
        self.output.push(segment);
        // Ids cached in the fill state pointed into the flushed arena
        for slot in &mut self.fill {
            slot.current_id = None;
        }
    }

    fn fill_id(&mut self, col: usize) -> CellId {
        self.fill[col].remaining -= 1;
        if let Some(id) = self.fill[col].current_id {
            return id;
        }
        // Re-materializing after a segment flush; a sibling column of the
        // same spanning cell may have a fresh id for it already
        let origin = self.fill[col].origin;
        let sibling = self
            .fill
            .iter()
            .find_map(|s| if s.origin == origin { s.current_id } else { None });
        let id = match sibling {
            Some(id) => id,
            None => self.current.push_cell(self.fill[col].proto.clone()),
        };
        self.fill[col].current_id = Some(id);
        id
    }

    fn add_row(&mut self, raw: &RawRow) {
        let mut row: Vec<CellId> = Vec::new();
        let mut has_content = false;
        let mut nested_after_row: Vec<(Vec<String>, &TableNode)> = Vec::new();

        for cell in &raw.cells {
            // Carry down pending rowspan cells occupying columns before
            // this cell
            while row.len() < self.fill.len() && self.fill[row.len()].remaining > 0 {
                let id = self.fill_id(row.len());
                row.push(id);
            }

            if !cell.nested.is_empty() {
                let mut titles = self.current.titles.clone();
                let text = cell.text.trim();
                if !text.is_empty() {
                    titles.push(text.to_string());
                }
                for sub in &cell.nested {
                    nested_after_row.push((titles.clone(), sub));
                }
            }

            let rowspan = cell.rowspan.max(1);
            let colspan = cell.colspan.max(1);
            let materialized = Cell {
                text: cell.text.clone(),
                kind: if cell.header {
                    CellKind::Header
                } else {
                    CellKind::Data
                },
                rowspan,
                colspan,
                style: cell.style_signature(),
            };
            has_content |= cell.header || !cell.text.is_empty();
            let id = self.current.push_cell(materialized.clone());
            self.next_origin += 1;
            let origin = self.next_origin;
            for _ in 0..colspan {
                if rowspan > 1 {
                    while self.fill.len() <= row.len() {
                        self.next_origin += 1;
                        self.fill.push(FillSlot {
                            proto: Cell {
                                text: String::new(),
                                kind: CellKind::Data,
                                rowspan: 1,
                                colspan: 1,
                                style: String::new(),
                            },
                            remaining: 0,
                            origin: self.next_origin,
                            current_id: None,
                        });
                    }
                    let slot = &mut self.fill[row.len()];
                    slot.proto = materialized.clone();
                    slot.remaining = rowspan - 1;
                    slot.origin = origin;
                    slot.current_id = Some(id);
                }
                row.push(id);
            }
        }

        if !row.is_empty() {
            // Cells spanning down from earlier rows may extend past the
            // last explicit cell of this row
            for i in row.len()..self.fill.len() {
                if self.fill[i].remaining == 0 {
                    continue;
                }
                while row.len() < i {
                    let filler = self.current.push_cell(Cell {
                        text: String::new(),
                        kind: CellKind::Data,
                        rowspan: 1,
                        colspan: 1,
                        style: String::new(),
                    });
                    row.push(filler);
                }
                let id = self.fill_id(i);
                row.push(id);
            }
            if has_content {
                self.current.rows.push(row);
            }
        }

        if !nested_after_row.is_empty() {
            self.flush_segment();
            for (titles, sub) in nested_after_row {
                let depth = self.current.depth + 1;
                self.output.extend(build_grids(sub, &titles, depth));
            }
        }
    }

    fn finish(mut self) -> Vec<CellGrid> {
        self.flush_segment();
        for grid in &mut self.output {
            repair_stacked_headers(grid);
        }
        self.output
    }
}

/// Build the grids for a table, splitting around nested sub-tables.
pub fn build_grids(table: &TableNode, titles: &[String], depth: usize) -> Vec<CellGrid> {
    let mut builder = GridBuilder::new(titles.to_vec(), depth);
    for row in &table.rows {
        builder.add_row(row);
    }
    builder.finish()
}

/// Split rows whose header stacks two category labels with a line break
/// into two rows, as if the labels had proper rowspan cells next to them.
fn repair_stacked_headers(grid: &mut CellGrid) {
    let mut i = 0;
    while i < grid.rows.len() {
        let row = &grid.rows[i];
        let needs_split = row.iter().any(|&id| {
            let c = grid.cell(id);
            c.is_header() && STACKED_HEADER_TEXTS.contains(&c.text.as_str())
        }) && row.iter().all(|&id| grid.cell(id).rowspan == 1);
        if !needs_split {
            i += 1;
            continue;
        }
        let row = grid.rows[i].clone();
        let mut row1: Vec<CellId> = Vec::new();
        let mut row2: Vec<CellId> = Vec::new();
        let mut mapping: fxhash::FxHashMap<CellId, (CellId, CellId)> =
            fxhash::FxHashMap::default();
        for id in row {
            let (id1, id2) = match mapping.get(&id) {
                Some(pair) => *pair,
                None => {
                    let cell = grid.cell(id).clone();
                    let pair = if cell.text.contains('\n') {
                        let mut lines = cell.text.trim().lines();
                        let first = lines.next().unwrap_or("").to_string();
                        let second = lines.next().unwrap_or("").to_string();
                        let top = Cell {
                            text: first,
                            ..cell.clone()
                        };
                        let bottom = Cell {
                            text: second,
                            ..cell
                        };
                        (grid.push_cell(top), grid.push_cell(bottom))
                    } else {
                        let shared = grid.push_cell(Cell {
                            rowspan: 2,
                            ..cell
                        });
                        (shared, shared)
                    };
                    mapping.insert(id, pair);
                    pair
                }
            };
            row1.push(id1);
            row2.push(id2);
        }
        grid.rows[i] = row1;
        grid.rows.insert(i + 1, row2);
        i += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_table() -> TableNode {
        TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header(""),
                RawCell::header("singular"),
                RawCell::header("plural"),
            ]),
            RawRow::new(vec![
                RawCell::header("nominative"),
                RawCell::data("kissa"),
                RawCell::data("kissat"),
            ]),
        ])
    }

    #[test]
    fn test_simple_grid() {
        let grids = build_grids(&simple_table(), &[], 0);
        assert_eq!(grids.len(), 1);
        let grid = &grids[0];
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0].len(), 3);
        assert_eq!(grid.cell(grid.rows[1][1]).text, "kissa");
        assert!(grid.cell(grid.rows[0][1]).is_header());
    }

    #[test]
    fn test_colspan_repeats_same_id() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("present").spanning(1, 2),
            ]),
            RawRow::new(vec![RawCell::data("a"), RawCell::data("b")]),
        ]);
        let grids = build_grids(&table, &[], 0);
        let grid = &grids[0];
        assert_eq!(grid.rows[0].len(), 2);
        assert_eq!(grid.rows[0][0], grid.rows[0][1]);
    }

    #[test]
    fn test_rowspan_carries_down() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("past").spanning(2, 1),
                RawCell::data("ran"),
            ]),
            RawRow::new(vec![RawCell::data("run")]),
        ]);
        let grids = build_grids(&table, &[], 0);
        let grid = &grids[0];
        assert_eq!(grid.rows[1].len(), 2);
        // The carried-down cell is the same cell, not a copy
        assert_eq!(grid.rows[0][0], grid.rows[1][0]);
        assert_eq!(grid.cell(grid.rows[1][1]).text, "run");
    }

    #[test]
    fn test_rowspan_extends_past_short_row() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::data("a"),
                RawCell::header("x").spanning(2, 1),
            ]),
            RawRow::new(vec![RawCell::data("b")]),
        ]);
        let grids = build_grids(&table, &[], 0);
        let grid = &grids[0];
        assert_eq!(grid.rows[1].len(), 2);
        assert_eq!(grid.rows[1][1], grid.rows[0][1]);
    }

    #[test]
    fn test_empty_rows_dropped() {
        let table = TableNode::new(vec![
            RawRow::new(vec![RawCell::data(""), RawCell::data("")]),
            RawRow::new(vec![RawCell::data("x")]),
        ]);
        let grids = build_grids(&table, &[], 0);
        assert_eq!(grids[0].rows.len(), 1);
    }

    #[test]
    fn test_nested_table_split() {
        let inner = TableNode::new(vec![RawRow::new(vec![
            RawCell::header("definite"),
            RawCell::data("an cat"),
        ])]);
        let table = TableNode::new(vec![
            RawRow::new(vec![RawCell::header("plain"), RawCell::data("cat")]),
            RawRow::new(vec![
                RawCell::data("Forms with the definite article").with_nested(inner),
            ]),
            RawRow::new(vec![RawCell::header("plural"), RawCell::data("cats")]),
        ]);
        let grids = build_grids(&table, &["Declension of cat".to_string()], 0);
        assert_eq!(grids.len(), 3);
        assert_eq!(grids[0].depth, 0);
        assert_eq!(grids[1].depth, 1);
        assert_eq!(
            grids[1].titles,
            vec![
                "Declension of cat".to_string(),
                "Forms with the definite article".to_string()
            ]
        );
        assert_eq!(grids[2].rows.len(), 1);
        assert_eq!(grids[2].cell(grids[2].rows[0][1]).text, "cats");
    }

    #[test]
    fn test_spanning_cell_shares_id_across_nested_split() {
        let inner = TableNode::new(vec![RawRow::new(vec![
            RawCell::header("definite"),
            RawCell::data("an cat"),
        ])]);
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("oblique").spanning(3, 2),
                RawCell::data("x"),
            ]),
            RawRow::new(vec![RawCell::data("more").with_nested(inner)]),
            RawRow::new(vec![RawCell::data("z")]),
        ]);
        let grids = build_grids(&table, &[], 0);
        assert_eq!(grids.len(), 3);
        // Before the split the spanning cell occupies both columns with
        // one id
        let first = &grids[0];
        assert_eq!(first.rows[1][0], first.rows[0][0]);
        assert_eq!(first.rows[1][1], first.rows[0][0]);
        // After the split it is re-materialized once, not per column
        let last = &grids[2];
        assert_eq!(last.rows[0].len(), 3);
        assert_eq!(last.rows[0][0], last.rows[0][1]);
        assert_eq!(last.cell(last.rows[0][0]).text, "oblique");
        assert_eq!(last.cell(last.rows[0][2]).text, "z");
    }

    #[test]
    fn test_stacked_header_repair() {
        let table = TableNode::new(vec![RawRow::new(vec![
            RawCell::header("inanimate\nanimate"),
            RawCell::data("stol\nbrata"),
            RawCell::data("stola"),
        ])]);
        let grids = build_grids(&table, &[], 0);
        let grid = &grids[0];
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.cell(grid.rows[0][0]).text, "inanimate");
        assert_eq!(grid.cell(grid.rows[1][0]).text, "animate");
        assert_eq!(grid.cell(grid.rows[0][1]).text, "stol");
        assert_eq!(grid.cell(grid.rows[1][1]).text, "brata");
        // The single-line cell is shared between both rows
        assert_eq!(grid.rows[0][2], grid.rows[1][2]);
        assert_eq!(grid.cell(grid.rows[0][2]).rowspan, 2);
    }

    #[test]
    fn test_text_without_refs() {
        let cell = Cell {
            text: "kissa¹".to_string(),
            kind: CellKind::Data,
            rowspan: 1,
            colspan: 1,
            style: String::new(),
        };
        assert_eq!(cell.text_without_refs(), "kissa");
    }
}

//! Header cell classification
//!
//! Decides whether a cell acts as a header, combining the markup's own
//! header/data distinction with several heuristics: header texts appearing
//! in data cells (gated by a per-language allow-list), footnote definition
//! starts, style match with the row's first column, and whole-column header
//! propagation triggered by the `*` wildcard.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::grid::Cell;
use crate::core::rules::{ResolveCtx, ResolveOpts, RuleTable};
use crate::core::tagset::Tagset;
use crate::data::policies::LangPolicy;
use crate::data::tags::{markers, TagVocab, IGNORED_COLVALUES};
use crate::features::cellclean::is_definition_start;
use crate::utils::diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticSink};
use crate::utils::text::distw;

lazy_static! {
    static ref PAREN_RE: Regex = Regex::new(r"\s*\([^)]*\)").unwrap();
    static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
    /// Header texts that are table titles, not column headers
    static ref TITLE_IN_HEADER_RE: Regex = Regex::new(
        r"^(Conjugation of |Declension of |Inflection of |Mutation of |Notes\b)"
    ).unwrap();
}

/// Outcome of classifying one cell.
#[derive(Debug, Clone)]
pub struct HeaderDecision {
    pub is_header: bool,
    /// Speculative resolution of the cleaned text, with `if` conditions
    /// ignored
    pub tagsets: Tagset,
    /// For "Header: value" cells, the value part to be handled as data
    pub target: Option<String>,
    /// Cell text, truncated to the header part for target cells
    pub text: String,
}

fn has_error_tag(tagsets: &Tagset) -> bool {
    tagsets
        .iter()
        .any(|combo| combo.iter().any(|t| t.starts_with("error-")))
}

fn has_dummy_tag(tagsets: &Tagset) -> bool {
    tagsets
        .iter()
        .any(|combo| combo.iter().any(|t| t.starts_with("dummy-")))
}

/// True when the classification marks the whole column below as headers.
pub fn spreads_to_column(tagsets: &Tagset) -> bool {
    tagsets
        .iter()
        .any(|combo| combo.iter().any(|t| t == markers::COLUMN_WILDCARD))
}

/// Classify a cell. `cleaned` is the cell text after cleanup, `col_index`
/// the cell's starting column, and `first_col_style` the style signature of
/// the row's first cell.
#[allow(clippy::too_many_arguments)]
pub fn classify_header(
    rules: &RuleTable,
    policy: &LangPolicy,
    vocab: &TagVocab,
    ctx: ResolveCtx<'_>,
    word: &str,
    cell: &Cell,
    cleaned: &str,
    col_index: usize,
    first_col_style: &str,
    cols_headered: &[bool],
    sink: &mut DiagnosticSink,
) -> HeaderDecision {
    let titletext = cell.text_without_refs();
    let cleaned_titletext = WS_RE
        .replace_all(PAREN_RE.replace_all(titletext, "").trim(), " ")
        .trim()
        .to_string();
    let tagsets = rules.resolve(
        policy,
        vocab,
        ctx,
        cleaned,
        &[],
        ResolveOpts {
            silent: true,
            ignore_tags: true,
        },
        sink,
    );
    let mut candidate = !has_error_tag(&tagsets);
    let ignored_cell = has_dummy_tag(&tagsets);

    // A data cell whose text resolves cleanly is only believed to be a
    // header when the language explicitly allows that text
    if candidate
        && !cell.is_header()
        && !cleaned.is_empty()
        && cleaned != markers::IGNORED_TEXT_CELL
        && !IGNORED_COLVALUES.contains(cleaned)
        && !policy.cells_as_headers.iter().any(|t| *t == cleaned)
    {
        if !ignored_cell {
            sink.add(
                Diagnostic::new(
                    DiagnosticLevel::Info,
                    "data cell text resolves as a header but is not allowed for this language",
                )
                .with_text(cleaned),
            );
        }
        candidate = false;
    }

    // Footnote definition starts bypass the allow-list
    if is_definition_start(cleaned) {
        candidate = true;
    }

    let mut is_header = false;
    let mut target = None;
    let mut text = cell.text.clone();

    if let Some(idx) = find_target_split(rules, titletext) {
        // "Header: value" cell; the prefix is the header, the value is data
        target = Some(titletext[idx + 2..].trim().to_string());
        text.truncate(idx.min(text.len()));
        is_header = true;
    } else if cell.is_header() && !titletext.contains(" + ") {
        is_header = true;
    } else if candidate
        && !IGNORED_COLVALUES.contains(cleaned_titletext.as_str())
        && distw(&cleaned_titletext, word) > 0.3
        && !matches!(cleaned_titletext.as_str(), "I" | "es")
    {
        is_header = true;
    } else if !first_col_style.is_empty()
        && cell.style == first_col_style
        && titletext != word
        && !IGNORED_COLVALUES.contains(cleaned)
        && cleaned != markers::IGNORED_TEXT_CELL
        && !cell.style.starts_with("////")
        && !titletext.contains(" + ")
    {
        // Same style as a first-column header; still subject to the
        // allow-list
        if ignored_cell || policy.cells_as_headers.iter().any(|t| *t == cleaned) {
            is_header = true;
        } else {
            sink.add(
                Diagnostic::new(
                    DiagnosticLevel::Info,
                    "data cell matches header style but is not allowed for this language",
                )
                .with_text(cleaned),
            );
        }
    }

    // A "*" header above this column turns every cell below into a header
    if !is_header && cols_headered.get(col_index).copied().unwrap_or(false) {
        is_header = true;
    }

    if TITLE_IN_HEADER_RE.is_match(titletext) {
        is_header = true;
    }

    HeaderDecision {
        is_header,
        tagsets,
        target,
        text,
    }
}

/// True when the cell text is really a table title.
pub fn is_table_title(text: &str) -> bool {
    TITLE_IN_HEADER_RE.is_match(text)
}

fn find_target_split(rules: &RuleTable, titletext: &str) -> Option<usize> {
    let idx = titletext.find(": ")?;
    if rules.contains(&titletext[..idx]) {
        Some(idx)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{Cell, CellKind};
    use crate::data::rules_builtin::builtin_rules;

    fn cell(text: &str, header: bool) -> Cell {
        Cell {
            text: text.to_string(),
            kind: if header { CellKind::Header } else { CellKind::Data },
            rowspan: 1,
            colspan: 1,
            style: String::new(),
        }
    }

    fn classify(c: &Cell, cleaned: &str, policy: &LangPolicy) -> HeaderDecision {
        let mut sink = DiagnosticSink::new();
        classify_header(
            builtin_rules(),
            policy,
            &TagVocab::builtin(),
            ResolveCtx {
                lang: "Finnish",
                pos: "noun",
                template: None,
                depth: 0,
            },
            "kissa",
            c,
            cleaned,
            0,
            "",
            &[],
            &mut sink,
        )
    }

    #[test]
    fn test_markup_header() {
        let c = cell("singular", true);
        let d = classify(&c, "singular", &LangPolicy::default());
        assert!(d.is_header);
        assert_eq!(d.tagsets, vec![vec!["singular".to_string()]]);
    }

    #[test]
    fn test_data_cell_not_header_without_allowlist() {
        let c = cell("singular", false);
        let d = classify(&c, "singular", &LangPolicy::default());
        assert!(!d.is_header);
    }

    #[test]
    fn test_data_cell_header_with_allowlist() {
        let c = cell("singular", false);
        let mut policy = LangPolicy::default();
        policy.cells_as_headers = vec!["singular"];
        let d = classify(&c, "singular", &policy);
        assert!(d.is_header);
    }

    #[test]
    fn test_form_data_cell_is_not_header() {
        let c = cell("kissat", false);
        let d = classify(&c, "kissat", &LangPolicy::default());
        assert!(!d.is_header);
    }

    #[test]
    fn test_plus_blocks_header() {
        let c = cell("avoir + participle", true);
        let d = classify(&c, "avoir + participle", &LangPolicy::default());
        assert!(!d.is_header);
    }

    #[test]
    fn test_target_cell() {
        let c = cell("Gerund: corriendo", true);
        let d = classify(&c, "Gerund: corriendo", &LangPolicy::default());
        assert!(d.is_header);
        assert_eq!(d.target.as_deref(), Some("corriendo"));
        assert_eq!(d.text, "Gerund");
    }

    #[test]
    fn test_column_wildcard_propagation() {
        let c = cell("kissat", false);
        let mut sink = DiagnosticSink::new();
        let d = classify_header(
            builtin_rules(),
            &LangPolicy::default(),
            &TagVocab::builtin(),
            ResolveCtx {
                lang: "Finnish",
                pos: "noun",
                template: None,
                depth: 0,
            },
            "kissa",
            &c,
            "kissat",
            1,
            "",
            &[false, true],
            &mut sink,
        );
        assert!(d.is_header);
    }

    #[test]
    fn test_case_header_spreads() {
        let c = cell("Case", true);
        let d = classify(&c, "Case", &LangPolicy::default());
        assert!(d.is_header);
        assert!(spreads_to_column(&d.tagsets));
    }

    #[test]
    fn test_title_header() {
        assert!(is_table_title("Declension of kissa"));
        let c = cell("Notes", false);
        let d = classify(&c, "Notes", &LangPolicy::default());
        assert!(d.is_header);
    }
}

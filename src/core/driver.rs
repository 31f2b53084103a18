//! Table scanning driver
//!
//! Walks the materialized cell grids of one table, classifies each cell as
//! a header or a data cell, tracks header spans and per-row tags, and emits
//! one [`FormRecord`] per extracted form. The scan never aborts on
//! suspicious input; problems become diagnostics and at worst a cell is
//! dropped or marked with the error tag.

use std::collections::BTreeSet;

use fxhash::{FxHashMap, FxHashSet};
use lazy_static::lazy_static;
use regex::Regex;

use crate::core::grid::{build_grids, CellGrid, CellId, TableNode};
use crate::core::header::{classify_header, spreads_to_column};
use crate::core::rules::{ResolveCtx, ResolveOpts, RuleTable};
use crate::core::spans::{compute_cell_tags, HeaderSpan};
use crate::core::tagset::{empty_tagset, remove_useless_tags, sorted_combo, TagCombo, Tagset};
use crate::data::policies::{LangPolicy, PolicyRegistry};
use crate::data::rules_builtin::builtin_rules;
use crate::data::tags::{markers, TagCategory, TagVocab, IGNORED_COLVALUES};
use crate::features::cellclean::extract_cell_content;
use crate::features::split::{
    extract_parenthetical, regroup_mixed_lines, split_into_alternatives,
    strip_semantic_brackets,
};
use crate::features::title::parse_title;
use crate::utils::diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticSink};
use crate::utils::text::{distw, is_superscript};

lazy_static! {
    static ref IPA_RE: Regex = Regex::new(r"^\s*/.*/\s*$").unwrap();
    static ref NOTES_ROW_RE: Regex = Regex::new(r"^(Note:|Notes:)").unwrap();
    static ref DATA_SKIP_RE: Regex = Regex::new(r"^(# |\(see )").unwrap();
    static ref PAREN_STRIP_RE: Regex = Regex::new(r"\s*\([^)]*\)").unwrap();
    static ref WS_RE: Regex = Regex::new(r"[ \t\r]+").unwrap();
    static ref LEADING_COMMA_RE: Regex = Regex::new(r"^\s*,\s*").unwrap();
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r"\s*,\s*$").unwrap();
    static ref REPEATED_COMMA_RE: Regex = Regex::new(r",(\s*,)+").unwrap();
    static ref MAIN_PREFIX_RE: Regex = Regex::new(r"(?i)^Main:\s*").unwrap();
}

// Tags that never propagate from a header to the columns below it
const NOINHERIT_TAGS: &[&str] = &[
    "infinitive-i",
    "infinitive-i-long",
    "infinitive-ii",
    "infinitive-iii",
    "infinitive-iv",
    "infinitive-v",
];

// Subject concord tags replaced under the object-concord marker
const OBJECT_CONCORD_REPLACEMENTS: &[(&str, &str)] = &[
    ("first-person", "object-first-person"),
    ("second-person", "object-second-person"),
    ("third-person", "object-third-person"),
    ("singular", "object-singular"),
    ("plural", "object-plural"),
    ("definite", "object-definite"),
    ("indefinite", "object-indefinite"),
];

// Saved article tags folded into following noun records
const ARTICLE_TAGS: &[&str] = &[
    "indefinite",
    "definite",
    "usually-without-article",
    "without-article",
];

const ARTICLE_KEEP_TAGS: &[&str] = &[
    "masculine",
    "feminine",
    "neuter",
    "singular",
    "plural",
    "indefinite",
    "definite",
    "usually-without-article",
    "without-article",
];

/// The rule table, policy registry and tag vocabulary used for scanning.
/// Construct once and reuse across tables; all lookups are read-only.
pub struct Engine {
    rules: RuleTable,
    policies: PolicyRegistry,
    vocab: TagVocab,
}

impl Engine {
    /// Engine with the built-in rules, policies and vocabulary.
    pub fn new() -> Self {
        Self {
            rules: builtin_rules().clone(),
            policies: PolicyRegistry::builtin(),
            vocab: TagVocab::builtin(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Mutable access for loading additional rules.
    pub fn rules_mut(&mut self) -> &mut RuleTable {
        &mut self.rules
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn policies_mut(&mut self) -> &mut PolicyRegistry {
        &mut self.policies
    }

    pub fn vocab(&self) -> &TagVocab {
        &self.vocab
    }

    pub fn vocab_mut(&mut self) -> &mut TagVocab {
        &mut self.vocab
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// What is being scanned: the headword, its language and part of speech,
/// and optional context from the surrounding page.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// The headword the table inflects
    pub word: String,
    pub lang: String,
    /// Part of speech, used by conditional rules and verb cleanups
    pub pos: String,
    /// Name of the template that produced the table, when known
    pub template: Option<String>,
    /// Source label recorded on every emitted record
    pub source: String,
    /// Text following the table, scanned for footnote definitions
    pub after_text: String,
}

impl ScanOptions {
    pub fn new(word: &str, lang: &str, pos: &str) -> Self {
        Self {
            word: word.to_string(),
            lang: lang.to_string(),
            pos: pos.to_string(),
            template: None,
            source: "inflection".to_string(),
            after_text: String::new(),
        }
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_after_text(mut self, text: &str) -> Self {
        self.after_text = text.to_string();
        self
    }
}

/// One extracted form with its grammatical tags.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "data-loading", derive(serde::Serialize))]
pub struct FormRecord {
    pub form: String,
    pub tags: Vec<String>,
    pub source: String,
    #[cfg_attr(
        feature = "data-loading",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub roman: Option<String>,
    #[cfg_attr(
        feature = "data-loading",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub ipa: Option<String>,
}

/// Result of scanning one table.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub forms: Vec<FormRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// State carried across the grids of one table: header spans stored for
/// reuse in nested segments, and the active section header.
#[derive(Debug, Default)]
pub struct TableContext {
    pub stored_spans: Vec<HeaderSpan>,
    pub section_header: TagCombo,
}

// Tags and extra records contributed by table titles.
#[derive(Debug, Default)]
struct TitleState {
    global_tags: Vec<String>,
    table_tags: Vec<String>,
    extra_forms: Vec<(String, Vec<String>)>,
    skip: bool,
    // At most one title row inside the table itself is honored
    row_taken: bool,
}

impl TitleState {
    fn absorb(&mut self, text: &str) {
        let c = parse_title(text);
        if c.skip_table {
            self.skip = true;
            return;
        }
        for t in c.global_tags {
            if !self.global_tags.contains(&t) {
                self.global_tags.push(t);
            }
        }
        for t in c.table_tags {
            if !self.table_tags.contains(&t) {
                self.table_tags.push(t);
            }
        }
        for f in c.extra_forms {
            if !self.extra_forms.contains(&f) {
                self.extra_forms.push(f);
            }
        }
    }
}

// The row's first header span and whether a later cell followed it
#[derive(Debug, Default, Clone, Copy)]
struct Col0 {
    idx: Option<usize>,
    followed: bool,
}

// Per-row scanning state
struct RowState {
    rownum: usize,
    rowtags: Tagset,
    have_text: bool,
    row_empty: bool,
    first_col_style: String,
    col0: Col0,
    row_len: usize,
}

struct TableScanner<'a> {
    rules: &'a RuleTable,
    policy: &'a LangPolicy,
    vocab: &'a TagVocab,
    opts: &'a ScanOptions,
    grid: &'a CellGrid,
    def_ht: &'a FxHashMap<String, Vec<String>>,
    sink: &'a mut DiagnosticSink,
    tcx: &'a mut TableContext,
    title: &'a mut TitleState,
    hdrspans: Vec<HeaderSpan>,
    cols_headered: Vec<bool>,
    has_covering_hdr: FxHashSet<usize>,
    some_has_covered_text: bool,
    first_col_has_text: bool,
    records: Vec<FormRecord>,
}

impl<'a> TableScanner<'a> {
    fn ctx(&self) -> ResolveCtx<'a> {
        let opts = self.opts;
        ResolveCtx {
            lang: &opts.lang,
            pos: &opts.pos,
            template: opts.template.as_deref(),
            depth: self.grid.depth,
        }
    }

    fn warn(&mut self, level: DiagnosticLevel, message: &str, text: &str) {
        let diag = Diagnostic::new(level, message)
            .with_context(&self.opts.word, &self.opts.lang)
            .with_text(text);
        self.sink.add(diag);
    }

    fn scan(&mut self) {
        let grid = self.grid;
        let width = grid.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        self.cols_headered = vec![false; width];
        let mut rownum = 0usize;
        for row in &grid.rows {
            if self.try_title_row(row) {
                continue;
            }
            if self.title.skip
                || self
                    .title
                    .global_tags
                    .iter()
                    .any(|t| t == markers::SKIP_THIS)
            {
                self.title.skip = true;
                return;
            }
            let first = grid.cell(row[0]);
            let mut state = RowState {
                rownum,
                rowtags: empty_tagset(),
                have_text: false,
                row_empty: true,
                first_col_style: if first.is_header() {
                    first.style.clone()
                } else {
                    String::new()
                },
                col0: Col0::default(),
                row_len: row.len(),
            };
            let all_headers_row = row.iter().all(|&id| grid.cell(id).is_header());
            for (col_idx, colspan, id) in runs(row) {
                let cell = grid.cell(id);
                let text = cell.text.trim();
                if !text.is_empty() && text != "-" {
                    state.row_empty = false;
                }
                self.process_cell(id, col_idx, colspan, all_headers_row, &mut state);
            }
            rownum += 1;
            if state.row_empty && self.policy.empty_row_resets {
                self.hdrspans.clear();
            }
            self.widen_col0(&state, state.row_len);
        }
    }

    // A row whose header cells all repeat one text is a table title, not a
    // header row
    fn try_title_row(&mut self, row: &[CellId]) -> bool {
        let grid = self.grid;
        let first = grid.cell(row[0]);
        if !first.is_header() {
            return false;
        }
        let text = first.text.trim().to_string();
        if text.is_empty() || text.chars().next().map(is_superscript).unwrap_or(false) {
            return false;
        }
        if !row.iter().all(|&id| {
            let c = grid.cell(id);
            c.is_header() && c.text.trim() == text
        }) {
            return false;
        }
        if NOTES_ROW_RE.is_match(&text) {
            return true;
        }
        if self.rules.contains(&text) || self.rules.matches_prefix(&text) {
            return false;
        }
        let flattened = WS_RE
            .replace_all(PAREN_STRIP_RE.replace_all(&text, "").trim(), " ")
            .into_owned();
        if !text.starts_with("Inflection ") && self.rules.contains(&flattened) {
            return false;
        }
        if !self.title.row_taken {
            self.title.row_taken = true;
            self.title.absorb(&text);
        }
        true
    }

    fn process_cell(
        &mut self,
        id: CellId,
        col_idx: usize,
        colspan: usize,
        all_headers_row: bool,
        state: &mut RowState,
    ) {
        let cell = self.grid.cell(id);
        let content = extract_cell_content(self.policy, &cell.text);
        if !content.defs.is_empty() {
            // Footnote definitions were harvested in the pre-pass
            return;
        }
        let refs: Vec<String> = ref_tags(self.def_ht, &content.refs)
            .into_iter()
            .chain(content.tags.iter().cloned())
            .collect();
        let ctx = self.ctx();
        let decision = classify_header(
            self.rules,
            self.policy,
            self.vocab,
            ctx,
            &self.opts.word,
            cell,
            &content.cleaned,
            col_idx,
            &state.first_col_style,
            &self.cols_headered,
            self.sink,
        );

        if let Some(target) = decision.target.clone() {
            let header_text = decision.text.trim().to_string();
            let v = self.rules.resolve(
                self.policy,
                self.vocab,
                ctx,
                &header_text,
                &[],
                ResolveOpts {
                    silent: true,
                    ..Default::default()
                },
                self.sink,
            );
            state.rowtags = merge_refs(v, &refs);
            self.process_data_cell(
                &target,
                &[],
                col_idx,
                colspan,
                cell.rowspan as usize,
                state,
            );
            return;
        }

        if decision.is_header {
            self.process_header_cell(
                &content.cleaned,
                &refs,
                col_idx,
                colspan,
                cell.rowspan as usize,
                all_headers_row,
                state,
            );
        } else {
            self.process_data_cell(
                &content.cleaned,
                &refs,
                col_idx,
                colspan,
                cell.rowspan as usize,
                state,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_header_cell(
        &mut self,
        cleaned: &str,
        refs: &[String],
        col_idx: usize,
        colspan: usize,
        rowspan: usize,
        all_headers_row: bool,
        state: &mut RowState,
    ) {
        if cleaned.is_empty() || cleaned == markers::IGNORED_TEXT_CELL {
            return;
        }
        if col_idx == 0 {
            self.first_col_has_text = true;
        }
        let ctx = self.ctx();
        let v = self.rules.resolve(
            self.policy,
            self.vocab,
            ctx,
            cleaned,
            &[],
            ResolveOpts {
                silent: true,
                ignore_tags: true,
            },
            self.sink,
        );

        // A wildcard header turns every cell of its columns into headers
        if spreads_to_column(&v) {
            for i in col_idx..(col_idx + colspan).min(self.cols_headered.len()) {
                self.cols_headered[i] = true;
            }
            return;
        }
        if contains_tag(&v, markers::RESET_HEADERS) {
            let keep_row = state.rownum.saturating_sub(rowspan.saturating_sub(1));
            self.hdrspans
                .retain(|s| s.start + s.colspan < col_idx || s.rownum >= keep_row);
        }
        if contains_tag(&v, markers::RESET_SECTION_HEADER) {
            self.tcx.section_header.clear();
        }
        if contains_tag(&v, markers::SECTION_HEADER) {
            let tags: BTreeSet<String> = v
                .iter()
                .flat_map(|c| c.iter())
                .filter(|t| !t.starts_with("dummy-"))
                .cloned()
                .collect();
            self.tcx.section_header = tags.into_iter().collect();
            return;
        }

        if state.have_text {
            state.rowtags = empty_tagset();
            state.have_text = false;
        }
        for i in col_idx..col_idx + colspan {
            self.has_covering_hdr.insert(i);
        }

        let (new_rowtags, new_coltags, all_hdr_tags) =
            self.generate_tags(cleaned, &state.rowtags, refs, col_idx, colspan);
        state.rowtags = new_rowtags;
        if contains_tag(&state.rowtags, markers::SKIP_THIS) {
            return;
        }
        if contains_tag(&all_hdr_tags, markers::LOAD_STORED_SPANS) {
            let stored = self.tcx.stored_spans.clone();
            self.hdrspans.extend(stored);
        }
        if contains_tag(&all_hdr_tags, markers::RESET_STORED_SPANS) {
            self.tcx.stored_spans.clear();
        }
        let store = contains_tag(&all_hdr_tags, markers::STORE_SPAN);

        let filtered: Tagset = new_coltags
            .into_iter()
            .filter(|combo| !combo.iter().any(|t| NOINHERIT_TAGS.contains(&t.as_str())))
            .collect();
        if filtered.iter().any(|c| !c.is_empty()) {
            self.add_header_span(
                col_idx,
                colspan,
                rowspan,
                state.rownum,
                filtered,
                cleaned,
                all_headers_row,
                store,
                &mut state.col0,
            );
        }
    }

    // Resolve a header text once per (row combination, column combination)
    // pair, producing the new row tags, the column tags for the span, and
    // the union of raw header tagsets for marker checks.
    fn generate_tags(
        &mut self,
        text: &str,
        rowtags: &Tagset,
        refs: &[String],
        col_idx: usize,
        colspan: usize,
    ) -> (Tagset, Tagset, Tagset) {
        let ct_list =
            compute_cell_tags(self.policy, self.vocab, &self.hdrspans, col_idx, colspan);
        let ctx = self.ctx();
        let mut new_rowtags: Tagset = Vec::new();
        let mut new_coltags: Tagset = Vec::new();
        let mut all_hdr_tags: Tagset = Vec::new();
        for rt0 in rowtags {
            for ct0 in &ct_list {
                let base: Vec<String> = {
                    let mut set: BTreeSet<String> = rt0.iter().cloned().collect();
                    set.extend(ct0.iter().cloned());
                    set.extend(self.title.global_tags.iter().cloned());
                    set.extend(self.title.table_tags.iter().cloned());
                    set.into_iter().collect()
                };
                let alts = self.rules.resolve(
                    self.policy,
                    self.vocab,
                    ctx,
                    text,
                    &base,
                    ResolveOpts::default(),
                    self.sink,
                );
                for tt in alts {
                    if !all_hdr_tags.contains(&tt) {
                        all_hdr_tags.push(tt.clone());
                    }
                    let col_combo =
                        sorted_combo(tt.iter().chain(refs.iter()).cloned());
                    if !new_coltags.contains(&col_combo) {
                        new_coltags.push(col_combo);
                    }
                    // A non-finite header under a mood row header replaces
                    // the mood instead of combining with it
                    let row_combo = if has_category(self.vocab, rt0, TagCategory::Mood)
                        && has_category(self.vocab, &tt, TagCategory::NonFinite)
                    {
                        sorted_combo(tt.iter().chain(refs.iter()).cloned())
                    } else {
                        sorted_combo(
                            tt.iter().chain(rt0.iter()).chain(refs.iter()).cloned(),
                        )
                    };
                    if !new_rowtags.contains(&row_combo) {
                        new_rowtags.push(row_combo);
                    }
                }
            }
        }
        if new_rowtags.is_empty() {
            new_rowtags.push(Vec::new());
        }
        (new_rowtags, new_coltags, all_hdr_tags)
    }

    #[allow(clippy::too_many_arguments)]
    fn add_header_span(
        &mut self,
        col_idx: usize,
        colspan: usize,
        rowspan: usize,
        rownum: usize,
        tagsets: Tagset,
        text: &str,
        all_headers_row: bool,
        store: bool,
        col0: &mut Col0,
    ) {
        let span = HeaderSpan {
            start: col_idx,
            colspan,
            rowspan,
            rownum,
            tagsets,
            text: text.to_string(),
            all_headers_row,
            expanded: false,
        };
        if store {
            self.tcx.stored_spans.push(span.clone());
        }
        let previously_seen = self.hdrspans.iter().any(|s| {
            s.text == span.text && s.tagsets == span.tagsets && s.start != span.start
        });
        self.hdrspans.push(span);
        let new_idx = self.hdrspans.len() - 1;
        if previously_seen {
            // A repeated header starts a new column group; the first
            // column header no longer expands over it
            col0.followed = true;
            return;
        }
        let has_tags = self.hdrspans[new_idx]
            .tagsets
            .iter()
            .any(|c| !c.is_empty());
        match col0.idx {
            None => {
                *col0 = Col0 {
                    idx: Some(new_idx),
                    followed: false,
                };
            }
            Some(i) if has_tags => {
                let col0_cats = tagset_categories(self.vocab, &self.hdrspans[i].tagsets);
                let later_cats =
                    tagset_categories(self.vocab, &self.hdrspans[new_idx].tagsets);
                let cont_ok = later_cats.iter().all(|c| {
                    *c == TagCategory::Dummy || self.policy.hdr_expand_cont.contains(c)
                });
                if !col0.followed
                    && self.hdrspans[i].rowspan >= rowspan
                    && cont_ok
                    && col0_cats.is_disjoint(&later_cats)
                {
                    // The later header refines the first one; keep the
                    // first header covering its columns
                    return;
                }
                let first_ok = col0_cats
                    .iter()
                    .all(|c| self.policy.hdr_expand_first.contains(c));
                let end = self.hdrspans[i].start + self.hdrspans[i].colspan;
                if !col0.followed && first_ok && col_idx > end {
                    let start = self.hdrspans[i].start;
                    self.hdrspans[i].colspan = col_idx - start;
                    self.hdrspans[i].expanded = true;
                }
                *col0 = Col0 {
                    idx: Some(new_idx),
                    followed: false,
                };
            }
            Some(_) => {}
        }
    }

    // At the end of a row, a first-column header of expandable categories
    // stretches over the rest of the row
    fn widen_col0(&mut self, state: &RowState, row_len: usize) {
        let i = match state.col0.idx {
            Some(i) => i,
            None => return,
        };
        if state.col0.followed {
            return;
        }
        let cats = tagset_categories(self.vocab, &self.hdrspans[i].tagsets);
        if !cats.iter().all(|c| self.policy.hdr_expand_first.contains(c)) {
            return;
        }
        let span = &self.hdrspans[i];
        if row_len > span.start + span.colspan {
            let start = span.start;
            self.hdrspans[i].colspan = row_len - start;
            self.hdrspans[i].expanded = true;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_data_cell(
        &mut self,
        cleaned: &str,
        cell_tags: &[String],
        col_idx: usize,
        colspan: usize,
        rowspan: usize,
        state: &mut RowState,
    ) {
        if cleaned.is_empty() || cleaned == markers::IGNORED_TEXT_CELL {
            return;
        }
        if DATA_SKIP_RE.is_match(cleaned) {
            return;
        }
        if col_idx == 0
            && !self.first_col_has_text
            && self.policy.ignore_top_left_text_cell
        {
            return;
        }
        state.col0.followed = true;
        state.have_text = true;
        if contains_tag(&state.rowtags, markers::SKIP_THIS) {
            return;
        }
        // A rowspan data cell before any row header belongs to the rows
        // below; it is re-encountered there with the proper tags
        if state.rowtags == empty_tagset() && rowspan > 1 {
            return;
        }
        let coltags =
            compute_cell_tags(self.policy, self.vocab, &self.hdrspans, col_idx, colspan);
        if contains_tag(&coltags, markers::IGNORED_TEXT_CELL) {
            return;
        }
        let text = WS_RE.replace_all(cleaned, " ").into_owned();
        let outcome = split_into_alternatives(self.policy, &text);
        let lines = regroup_mixed_lines(self.vocab, outcome.alternatives);
        let rowtags = state.rowtags.clone();
        let mut line_tags = outcome.extra_tags;
        for t in cell_tags {
            if !line_tags.contains(t) {
                line_tags.push(t.clone());
            }
        }
        for (form, base_roman, ipa) in lines {
            self.process_form_line(
                &form,
                &base_roman,
                &ipa,
                &line_tags,
                &rowtags,
                &coltags,
                col_idx,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_form_line(
        &mut self,
        form: &str,
        base_roman: &str,
        ipa: &str,
        split_tags: &[String],
        rowtags: &Tagset,
        coltags: &Tagset,
        col_idx: usize,
    ) {
        let mut form = form.trim().to_string();
        let mut extra_tags: Vec<String> = split_tags.to_vec();
        if let Some((replacement, tags)) = self.policy.form_replacements.get(form.as_str())
        {
            form = replacement.to_string();
            extra_tags.extend(tags.split_whitespace().map(str::to_string));
        }
        // Peel per-form reference markers
        let content = extract_cell_content(self.policy, &form);
        if content.cleaned == markers::IGNORED_TEXT_CELL {
            return;
        }
        form = content.cleaned;
        extra_tags.extend(content.tags);
        let refs: Vec<String> = ref_tags(self.def_ht, &content.refs);

        form = LEADING_COMMA_RE.replace(&form, "").into_owned();
        form = TRAILING_COMMA_RE.replace(&form, "").into_owned();
        form = REPEATED_COMMA_RE.replace_all(&form, ",").into_owned();
        form = MAIN_PREFIX_RE.replace(&form, "").into_owned();
        form = WS_RE.replace_all(form.trim(), " ").into_owned();

        let (stripped, bracket_tags) = strip_semantic_brackets(self.policy, &form);
        extra_tags.extend(bracket_tags);
        let paren = extract_parenthetical(self.vocab, &stripped, base_roman);
        form = paren.form;
        let roman = paren.roman;
        extra_tags.extend(paren.extra_tags);
        let clitic = paren.clitic;

        if form.is_empty() {
            return;
        }
        // A form identical to a known header text is a misplaced header
        // unless it happens to resemble the headword
        if !IGNORED_COLVALUES.contains(form.as_str()) && self.rules.contains(&form) {
            let d = distw(&form, &self.opts.word);
            if d < 0.1 {
                self.warn(
                    DiagnosticLevel::Info,
                    "form matches a header text but resembles the headword; kept",
                    &form,
                );
            } else if d < 0.3 {
                self.warn(
                    DiagnosticLevel::Info,
                    "form matches a header text; skipped",
                    &form,
                );
                return;
            } else {
                return;
            }
        }
        self.merge_and_emit(
            rowtags,
            coltags,
            &form,
            &roman,
            ipa,
            clitic.as_deref(),
            &extra_tags,
            &refs,
            col_idx,
        );
    }

    // Cross every row tag combination with every column tag combination and
    // emit one record per pair.
    #[allow(clippy::too_many_arguments)]
    fn merge_and_emit(
        &mut self,
        rowtags: &Tagset,
        coltags: &Tagset,
        form: &str,
        roman: &str,
        ipa: &str,
        clitic: Option<&str>,
        extra_tags: &[String],
        refs: &[String],
        col_idx: usize,
    ) {
        let section = self.tcx.section_header.clone();
        for rt in rowtags {
            for ct in coltags {
                let mut tags: BTreeSet<String> = BTreeSet::new();
                tags.extend(self.title.global_tags.iter().cloned());
                tags.extend(extra_tags.iter().cloned());
                tags.extend(rt.iter().cloned());
                tags.extend(refs.iter().cloned());
                tags.extend(section.iter().cloned());

                // Column tags yield to row tags of the same axis
                let row_cats: BTreeSet<TagCategory> = tags
                    .iter()
                    .filter_map(|t| self.vocab.category(t))
                    .collect();
                for t in ct {
                    let cat = self.vocab.category(t);
                    let blocked = matches!(
                        cat,
                        Some(TagCategory::Mood)
                            | Some(TagCategory::Case)
                            | Some(TagCategory::Number)
                    ) && cat.map(|c| row_cats.contains(&c)).unwrap_or(false);
                    if !blocked {
                        tags.insert(t.clone());
                    }
                }

                if tags.contains("personal")
                    && !tags.contains("pronoun")
                    && ["first-person", "second-person", "third-person"]
                        .iter()
                        .any(|p| tags.contains(*p))
                {
                    tags.remove("personal");
                }
                if tags.contains("impersonal") {
                    for t in [
                        "first-person",
                        "second-person",
                        "third-person",
                        "singular",
                        "plural",
                    ] {
                        tags.remove(t);
                    }
                }
                if self.opts.pos == "verb" && tags.contains("positive") {
                    tags.remove("positive");
                    tags.remove("negative");
                }
                if self.policy.masc_only_animate && !tags.contains("masculine") {
                    tags.remove("animate");
                    tags.remove("inanimate");
                }
                if tags.contains("includes-article") && !form.contains(' ') {
                    tags.remove("includes-article");
                }

                let mut form = form.to_string();
                if IGNORED_COLVALUES.contains(form.as_str()) {
                    if tags.contains(markers::IGNORE_SKIPPED) {
                        continue;
                    }
                    if !self.has_covering_hdr.contains(&col_idx)
                        && self.some_has_covered_text
                    {
                        continue;
                    }
                    form = "-".to_string();
                } else if self.has_covering_hdr.contains(&col_idx) {
                    self.some_has_covered_text = true;
                }

                if tags.contains(markers::OBJECT_CONCORD) {
                    let replaced: BTreeSet<String> = tags
                        .iter()
                        .map(|t| {
                            OBJECT_CONCORD_REPLACEMENTS
                                .iter()
                                .find(|(from, _)| from == t)
                                .map(|(_, to)| to.to_string())
                                .unwrap_or_else(|| t.clone())
                        })
                        .collect();
                    tags = replaced;
                }
                if tags.contains(markers::REMOVE_THIS_CELL) {
                    continue;
                }
                tags.retain(|t| !t.starts_with("dummy-"));
                remove_useless_tags(self.policy, &mut tags);

                if tags.is_empty() {
                    self.warn(
                        DiagnosticLevel::Warning,
                        "no tags for extracted form",
                        &form,
                    );
                }
                if IPA_RE.is_match(&form) {
                    self.warn(
                        DiagnosticLevel::Warning,
                        "form looks like an IPA pronunciation",
                        &form,
                    );
                    continue;
                }

                let tags: Vec<String> = tags.into_iter().collect();
                self.emit(&form, tags.clone(), roman, ipa);
                if let Some(clitic) = clitic {
                    let mut clitic_tags = tags;
                    if !clitic_tags.iter().any(|t| t == "clitic") {
                        clitic_tags.push("clitic".to_string());
                        clitic_tags.sort();
                    }
                    self.emit(clitic, clitic_tags, "", "");
                }
            }
        }
    }

    fn emit(&mut self, form: &str, tags: Vec<String>, roman: &str, ipa: &str) {
        let record = FormRecord {
            form: form.to_string(),
            tags,
            source: self.opts.source.clone(),
            roman: if roman.is_empty() {
                None
            } else {
                Some(roman.to_string())
            },
            ipa: if ipa.is_empty() {
                None
            } else {
                Some(ipa.to_string())
            },
        };
        if !self.records.contains(&record) {
            self.records.push(record);
        }
    }
}

fn runs(row: &[CellId]) -> Vec<(usize, usize, CellId)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < row.len() {
        let id = row[i];
        let mut j = i + 1;
        while j < row.len() && row[j] == id {
            j += 1;
        }
        out.push((i, j - i, id));
        i = j;
    }
    out
}

fn contains_tag(tagset: &Tagset, tag: &str) -> bool {
    tagset.iter().any(|combo| combo.iter().any(|t| t == tag))
}

fn has_category(vocab: &TagVocab, combo: &[String], cat: TagCategory) -> bool {
    combo.iter().any(|t| vocab.category(t) == Some(cat))
}

fn tagset_categories(vocab: &TagVocab, tagset: &Tagset) -> BTreeSet<TagCategory> {
    tagset
        .iter()
        .flat_map(|combo| combo.iter())
        .filter_map(|t| vocab.category(t))
        .collect()
}

fn merge_refs(tagsets: Tagset, refs: &[String]) -> Tagset {
    if refs.is_empty() {
        return tagsets;
    }
    let mut out: Tagset = Vec::new();
    for combo in tagsets {
        let merged = sorted_combo(combo.into_iter().chain(refs.iter().cloned()));
        if !out.contains(&merged) {
            out.push(merged);
        }
    }
    out
}

fn ref_tags(def_ht: &FxHashMap<String, Vec<String>>, refs: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in refs {
        if let Some(tags) = def_ht.get(r) {
            for t in tags {
                if !out.contains(t) {
                    out.push(t.clone());
                }
            }
        }
    }
    out
}

fn lowercase_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// A footnote definition becomes tags when every word of a comma-separated
// group is in the vocabulary
fn decode_definition(vocab: &TagVocab, text: &str) -> Vec<String> {
    let mut tags: BTreeSet<String> = BTreeSet::new();
    for part in text.split(',') {
        let words: Vec<&str> = part.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        if words
            .iter()
            .all(|w| vocab.contains(w) || vocab.contains(&lowercase_first(w)))
        {
            for w in words {
                if vocab.contains(w) {
                    tags.insert(w.to_string());
                } else {
                    tags.insert(lowercase_first(w));
                }
            }
        }
    }
    tags.into_iter().collect()
}

fn harvest_definitions(
    policy: &LangPolicy,
    vocab: &TagVocab,
    grids: &[CellGrid],
    after_text: &str,
) -> FxHashMap<String, Vec<String>> {
    let mut map: FxHashMap<String, Vec<String>> = FxHashMap::default();
    let mut add = |defs: &[(String, String)]| {
        for (symbol, definition) in defs {
            let tags = decode_definition(vocab, definition);
            if !tags.is_empty() {
                map.insert(symbol.clone(), tags);
            }
        }
    };
    for grid in grids {
        for row in &grid.rows {
            for (_, _, id) in runs(row) {
                let content = extract_cell_content(policy, &grid.cell(id).text);
                add(&content.defs);
            }
        }
    }
    if !after_text.trim().is_empty() {
        for line in after_text.lines() {
            let content = extract_cell_content(policy, line);
            add(&content.defs);
        }
    }
    map
}

fn post_process(policy: &LangPolicy, opts: &ScanOptions, records: &mut Vec<FormRecord>) {
    if policy.articles_in_separate_columns
        && records.iter().any(|r| r.tags.iter().any(|t| t == "noun"))
    {
        fold_article_columns(policy, records);
    }
    if !policy.conditionally_ignored_cells.is_empty() {
        records.retain(|r| {
            !policy.conditionally_ignored_cells.iter().any(|rule| {
                rule.texts.iter().any(|t| *t == r.form)
                    && !rule.texts.iter().any(|t| *t == opts.word)
                    && rule.tags.iter().all(|t| r.tags.iter().any(|rt| rt == t))
            })
        });
    }
    if policy.promote_multiword && opts.pos == "verb" {
        let word_count = opts.word.split_whitespace().count();
        for r in records.iter_mut() {
            if r.form.split_whitespace().count() > word_count
                && !r.tags.iter().any(|t| t == "multiword-construction")
            {
                r.tags.push("multiword-construction".to_string());
                r.tags.sort();
            }
        }
    }
}

// Fold standalone article records into the noun forms they accompany
fn fold_article_columns(policy: &LangPolicy, records: &mut Vec<FormRecord>) {
    let mut saved: BTreeSet<String> = BTreeSet::new();
    let mut had_noun = false;
    let mut out: Vec<FormRecord> = Vec::new();
    for mut record in records.drain(..) {
        if record.tags.iter().any(|t| t == "noun") {
            let mut tags: BTreeSet<String> = record
                .tags
                .iter()
                .filter(|t| *t != "noun")
                .cloned()
                .collect();
            tags.extend(saved.iter().cloned());
            remove_useless_tags(policy, &mut tags);
            record.tags = tags.into_iter().collect();
            had_noun = true;
            out.push(record);
        } else if record
            .tags
            .iter()
            .any(|t| ARTICLE_TAGS.contains(&t.as_str()))
        {
            let tags: BTreeSet<String> = record.tags.iter().cloned().collect();
            if had_noun {
                saved = tags;
            } else {
                saved.extend(tags);
                remove_useless_tags(policy, &mut saved);
            }
            saved.retain(|t| ARTICLE_KEEP_TAGS.contains(&t.as_str()));
            had_noun = false;
        } else {
            out.push(record);
        }
    }
    *records = out;
}

/// Extract all inflected forms from one table.
pub fn extract_forms(engine: &Engine, table: &TableNode, opts: &ScanOptions) -> ScanOutput {
    let mut sink = DiagnosticSink::new();
    let policy = engine.policies.policy_for(&opts.lang);
    let grids = build_grids(table, &[], 0);
    let def_ht = harvest_definitions(&policy, &engine.vocab, &grids, &opts.after_text);
    let mut tcx = TableContext::default();
    let mut title = TitleState::default();
    let mut records: Vec<FormRecord> = Vec::new();

    for grid in &grids {
        for t in &grid.titles {
            title.absorb(t);
        }
        if title.skip {
            break;
        }
        let mut scanner = TableScanner {
            rules: &engine.rules,
            policy: &policy,
            vocab: &engine.vocab,
            opts,
            grid,
            def_ht: &def_ht,
            sink: &mut sink,
            tcx: &mut tcx,
            title: &mut title,
            hdrspans: Vec::new(),
            cols_headered: Vec::new(),
            has_covering_hdr: FxHashSet::default(),
            some_has_covered_text: false,
            first_col_has_text: false,
            records: Vec::new(),
        };
        scanner.scan();
        let mut scanned = std::mem::take(&mut scanner.records);
        records.append(&mut scanned);
    }
    if title.skip {
        return ScanOutput {
            forms: Vec::new(),
            diagnostics: sink.into_vec(),
        };
    }

    post_process(&policy, opts, &mut records);

    let mut forms: Vec<FormRecord> = Vec::new();
    if !records.is_empty() || !title.table_tags.is_empty() {
        let tag_set: BTreeSet<String> = title.table_tags.iter().cloned().collect();
        let form = if tag_set.is_empty() {
            "no-table-tags".to_string()
        } else {
            tag_set.into_iter().collect::<Vec<_>>().join(" ")
        };
        forms.push(FormRecord {
            form,
            tags: vec![markers::TABLE_TAGS.to_string()],
            source: opts.source.clone(),
            roman: None,
            ipa: None,
        });
        if let Some(ref template) = opts.template {
            forms.push(FormRecord {
                form: template.clone(),
                tags: vec![markers::INFLECTION_TEMPLATE.to_string()],
                source: opts.source.clone(),
                roman: None,
                ipa: None,
            });
        }
        for (form, tags) in &title.extra_forms {
            forms.push(FormRecord {
                form: form.clone(),
                tags: tags.clone(),
                source: opts.source.clone(),
                roman: None,
                ipa: None,
            });
        }
    }

    // Deduplicate; a dated variant is dropped when the same form already
    // occurs without the dated tag
    let mut have: FxHashSet<(String, Vec<String>, Option<String>, Option<String>)> =
        FxHashSet::default();
    for record in records {
        let key = (
            record.form.clone(),
            record.tags.clone(),
            record.roman.clone(),
            record.ipa.clone(),
        );
        if have.contains(&key) {
            continue;
        }
        if record.tags.iter().any(|t| t == "dated") {
            let undated: Vec<String> = record
                .tags
                .iter()
                .filter(|t| *t != "dated")
                .cloned()
                .collect();
            if !undated.is_empty()
                && have.contains(&(
                    record.form.clone(),
                    undated,
                    record.roman.clone(),
                    record.ipa.clone(),
                ))
            {
                continue;
            }
        }
        have.insert(key);
        forms.push(record);
    }

    ScanOutput {
        forms,
        diagnostics: sink.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{RawCell, RawRow};
    use pretty_assertions::assert_eq;

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

    fn tags_of(out: &ScanOutput, form: &str) -> Vec<String> {
        out.forms
            .iter()
            .find(|r| r.form == form)
            .map(|r| r.tags.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_simple_noun_table() {
        let engine = Engine::new();
        let opts = ScanOptions::new("kissa", "Finnish", "noun");
        let out = extract_forms(&engine, &simple_table(), &opts);
        assert_eq!(out.forms[0].form, "no-table-tags");
        assert_eq!(out.forms[0].tags, vec!["table-tags".to_string()]);
        assert_eq!(
            tags_of(&out, "kissa"),
            vec!["nominative".to_string(), "singular".to_string()]
        );
        assert_eq!(
            tags_of(&out, "kissat"),
            vec!["nominative".to_string(), "plural".to_string()]
        );
    }

    #[test]
    fn test_template_record() {
        let engine = Engine::new();
        let opts =
            ScanOptions::new("kissa", "Finnish", "noun").with_template("fi-decl-kissa");
        let out = extract_forms(&engine, &simple_table(), &opts);
        assert_eq!(out.forms[1].form, "fi-decl-kissa");
        assert_eq!(
            out.forms[1].tags,
            vec!["inflection-template".to_string()]
        );
    }

    #[test]
    fn test_rowspan_header_applies_to_both_rows() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("past").spanning(2, 1),
                RawCell::data("ran"),
            ]),
            RawRow::new(vec![RawCell::data("run")]),
        ]);
        let engine = Engine::new();
        let opts = ScanOptions::new("run", "English", "verb");
        let out = extract_forms(&engine, &table, &opts);
        assert_eq!(tags_of(&out, "ran"), vec!["past".to_string()]);
        assert_eq!(tags_of(&out, "run"), vec!["past".to_string()]);
    }

    #[test]
    fn test_comma_splits_into_alternatives() {
        let table = TableNode::new(vec![RawRow::new(vec![
            RawCell::header("plural"),
            RawCell::data("kissat, kissoja"),
        ])]);
        let engine = Engine::new();
        let opts = ScanOptions::new("kissa", "Finnish", "noun");
        let out = extract_forms(&engine, &table, &opts);
        assert_eq!(tags_of(&out, "kissat"), vec!["plural".to_string()]);
        assert_eq!(tags_of(&out, "kissoja"), vec!["plural".to_string()]);
    }

    #[test]
    fn test_ipa_line_attached_to_form() {
        let table = TableNode::new(vec![RawRow::new(vec![
            RawCell::header("past"),
            RawCell::data("ran\n/ræn/"),
        ])]);
        let engine = Engine::new();
        let opts = ScanOptions::new("run", "English", "verb");
        let out = extract_forms(&engine, &table, &opts);
        let record = out.forms.iter().find(|r| r.form == "ran").unwrap();
        assert_eq!(record.ipa.as_deref(), Some("/ræn/"));
    }

    #[test]
    fn test_footnote_definition_tags_referencing_form() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("plural"),
                RawCell::data("kissat¹"),
            ]),
            RawRow::new(vec![RawCell::data("¹ dialectal, colloquial")]),
        ]);
        let engine = Engine::new();
        let opts = ScanOptions::new("kissa", "Finnish", "noun");
        let out = extract_forms(&engine, &table, &opts);
        let tags = tags_of(&out, "kissat");
        assert!(tags.contains(&"colloquial".to_string()));
        assert!(tags.contains(&"dialectal".to_string()));
        assert!(tags.contains(&"plural".to_string()));
    }

    #[test]
    fn test_placeholder_cell_emits_dash() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header(""),
                RawCell::header("singular"),
                RawCell::header("plural"),
            ]),
            RawRow::new(vec![
                RawCell::header("vocative"),
                RawCell::data("kissa"),
                RawCell::data("—"),
            ]),
        ]);
        let engine = Engine::new();
        let opts = ScanOptions::new("kissa", "Finnish", "noun");
        let out = extract_forms(&engine, &table, &opts);
        assert_eq!(
            tags_of(&out, "-"),
            vec!["plural".to_string(), "vocative".to_string()]
        );
    }

    #[test]
    fn test_unrecognized_header_degrades_to_error_tag() {
        let table = TableNode::new(vec![RawRow::new(vec![
            RawCell::header("frobnicative"),
            RawCell::data("kissalle"),
        ])]);
        let engine = Engine::new();
        let opts = ScanOptions::new("kissa", "Finnish", "noun");
        let out = extract_forms(&engine, &table, &opts);
        assert_eq!(
            tags_of(&out, "kissalle"),
            vec![markers::ERROR_UNRECOGNIZED.to_string()]
        );
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Warning));
    }

    #[test]
    fn test_title_row_contributes_global_tags() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("Negative conjugation of olla").spanning(1, 2),
            ]),
            RawRow::new(vec![
                RawCell::header("present"),
                RawCell::data("en ole"),
            ]),
        ]);
        let engine = Engine::new();
        let opts = ScanOptions::new("olla", "Finnish", "verb");
        let out = extract_forms(&engine, &table, &opts);
        let tags = tags_of(&out, "en ole");
        assert!(tags.contains(&"negative".to_string()));
        assert!(tags.contains(&"present".to_string()));
    }

    #[test]
    fn test_title_wordtags_in_table_tags_record() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("Conjugation of laufen (irregular verb)")
                    .spanning(1, 2),
            ]),
            RawRow::new(vec![
                RawCell::header("present"),
                RawCell::data("läuft"),
            ]),
        ]);
        let engine = Engine::new();
        let opts = ScanOptions::new("laufen", "German", "verb");
        let out = extract_forms(&engine, &table, &opts);
        assert_eq!(out.forms[0].form, "irregular");
        assert_eq!(out.forms[0].tags, vec!["table-tags".to_string()]);
        // The wordtag is table scope, not per form
        assert_eq!(tags_of(&out, "läuft"), vec!["present".to_string()]);
    }

    #[test]
    fn test_determinism() {
        let engine = Engine::new();
        let opts = ScanOptions::new("kissa", "Finnish", "noun");
        let first = extract_forms(&engine, &simple_table(), &opts);
        for _ in 0..5 {
            let again = extract_forms(&engine, &simple_table(), &opts);
            assert_eq!(first.forms, again.forms);
        }
    }

    #[test]
    fn test_duplicate_forms_deduplicated() {
        let table = TableNode::new(vec![
            RawRow::new(vec![RawCell::header("plural"), RawCell::data("kissat")]),
            RawRow::new(vec![RawCell::header("plural"), RawCell::data("kissat")]),
        ]);
        let engine = Engine::new();
        let opts = ScanOptions::new("kissa", "Finnish", "noun");
        let out = extract_forms(&engine, &table, &opts);
        let count = out.forms.iter().filter(|r| r.form == "kissat").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_multiword_promotion() {
        let mut records = vec![FormRecord {
            form: "will have gone".to_string(),
            tags: vec!["future".to_string(), "perfect".to_string()],
            source: "inflection".to_string(),
            roman: None,
            ipa: None,
        }];
        let mut policy = LangPolicy::default();
        policy.promote_multiword = true;
        post_process(&policy, &ScanOptions::new("go", "English", "verb"), &mut records);
        assert!(records[0]
            .tags
            .contains(&"multiword-construction".to_string()));
    }

    #[test]
    fn test_article_columns_folded() {
        let mut policy = LangPolicy::default();
        policy.articles_in_separate_columns = true;
        let mut records = vec![
            FormRecord {
                form: "der".to_string(),
                tags: vec![
                    "definite".to_string(),
                    "masculine".to_string(),
                    "nominative".to_string(),
                    "singular".to_string(),
                ],
                source: "inflection".to_string(),
                roman: None,
                ipa: None,
            },
            FormRecord {
                form: "Hund".to_string(),
                tags: vec!["nominative".to_string(), "noun".to_string(), "singular".to_string()],
                source: "inflection".to_string(),
                roman: None,
                ipa: None,
            },
        ];
        post_process(
            &policy,
            &ScanOptions::new("Hund", "German", "noun"),
            &mut records,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].form, "Hund");
        assert!(records[0].tags.contains(&"definite".to_string()));
        assert!(records[0].tags.contains(&"masculine".to_string()));
        assert!(!records[0].tags.contains(&"noun".to_string()));
    }

    #[test]
    fn test_skip_table_title() {
        let table = TableNode::new(vec![
            RawRow::new(vec![
                RawCell::header("Historical inflection of sche").spanning(1, 2),
            ]),
            RawRow::new(vec![
                RawCell::header("nominative"),
                RawCell::data("sche"),
            ]),
        ]);
        let engine = Engine::new();
        let opts = ScanOptions::new("sche", "Middle English", "pron");
        let out = extract_forms(&engine, &table, &opts);
        assert!(out.forms.is_empty());
    }

    #[test]
    fn test_greek_paren_form_informal() {
        let table = TableNode::new(vec![RawRow::new(vec![
            RawCell::header("second-person singular"),
            RawCell::data("(είσαι)"),
        ])]);
        let engine = Engine::new();
        let opts = ScanOptions::new("είμαι", "Greek", "verb");
        let out = extract_forms(&engine, &table, &opts);
        let tags = tags_of(&out, "είσαι");
        assert!(tags.contains(&"informal".to_string()));
    }
}

//! Header span tracking
//!
//! As the driver walks a grid it appends a [`HeaderSpan`] for every header
//! cell. When a data cell is reached, [`compute_cell_tags`] scans the
//! recorded spans from the most recent row upward, merging tags that apply
//! to the cell's column range and stopping when it reaches headers that
//! belong to an unrelated part of the table. The stop/skip decisions are
//! structural first (partial column overlap) and category-based second,
//! with the language policy refining the category ladder.

use std::collections::BTreeSet;

use fxhash::FxHashSet;

use crate::core::tagset::{and_tagsets, empty_tagset, or_tagsets, tagset_cats, Tagset};
use crate::data::policies::{LangPolicy, SpanReuse};
use crate::data::tags::{TagCategory, TagVocab};

/// A header's horizontal extent and resolved tags.
#[derive(Debug, Clone)]
pub struct HeaderSpan {
    /// First column covered
    pub start: usize,
    pub colspan: usize,
    pub rowspan: usize,
    /// Row the header was seen on
    pub rownum: usize,
    pub tagsets: Tagset,
    /// Original header text, kept for diagnostics
    pub text: String,
    /// Whether every cell on that row was a header
    pub all_headers_row: bool,
    /// Span was artificially widened to cover columns it did not
    /// originally span
    pub expanded: bool,
}

impl HeaderSpan {
    fn end(&self) -> usize {
        self.start + self.colspan
    }
}

// Categories whose tags are dropped when they only occur inside the cell's
// own column range on that header row
const NARROW_CATS: &[TagCategory] = &[
    TagCategory::Gender,
    TagCategory::Number,
    TagCategory::Person,
    TagCategory::Case,
    TagCategory::Class,
    TagCategory::Voice,
];

/// Compute the column tags for a cell spanning `[start, start+colspan)`.
pub fn compute_cell_tags(
    policy: &LangPolicy,
    vocab: &TagVocab,
    spans: &[HeaderSpan],
    start: usize,
    colspan: usize,
) -> Tagset {
    let end = start + colspan;
    let mut used_keys: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut used_spans: FxHashSet<usize> = FxHashSet::default();
    let mut coltags = empty_tagset();
    let mut row_tagsets = empty_tagset();
    let mut row_tagsets_rownum = usize::MAX;
    let mut last_header_row = usize::MAX;

    'scan: for idx in (0..spans.len()).rev() {
        let span = &spans[idx];
        if span.end() <= start || span.start >= end {
            continue;
        }
        // A header sticking out of the cell's left edge belongs to an
        // unrelated part of the table
        if span.start < start && span.end() > start && span.end() < end {
            break;
        }
        // Same on the right edge, unless the span was widened on purpose
        if span.start < end && span.start > start && span.end() > end && !span.expanded {
            break;
        }
        if !used_spans.insert(idx) {
            continue;
        }
        let mut tagsets = span.tagsets.clone();

        // A span strictly inside the cell's range shares the row with
        // sibling headers; merge them and narrow to categories that also
        // occur outside the range
        if !span.expanded && (span.start > start || span.end() < end) {
            let mut in_cats: BTreeSet<TagCategory> = BTreeSet::new();
            for x in spans {
                if x.rownum == span.rownum && x.start >= start && x.end() <= end {
                    in_cats.extend(tagset_cats(&x.tagsets, vocab));
                }
            }
            let mut includes_all_on_row = true;
            for (xi, x) in spans.iter().enumerate() {
                if x.rownum != span.rownum {
                    continue;
                }
                if x.start < start || x.end() > end {
                    includes_all_on_row = false;
                    continue;
                }
                if !used_spans.insert(xi) {
                    continue;
                }
                tagsets = or_tagsets(policy, vocab, &tagsets, &x.tagsets);
            }
            let ts_cats = tagset_cats(&tagsets, vocab);
            if includes_all_on_row
                || (ts_cats.contains(&TagCategory::Tense)
                    && ts_cats.contains(&TagCategory::Object))
            {
                // All headers of the row are inside the cell; they select
                // nothing
                tagsets = empty_tagset();
            }
            if in_cats.iter().all(|c| NARROW_CATS.contains(c)) {
                if in_cats.contains(&TagCategory::Number)
                    || in_cats.contains(&TagCategory::Gender)
                {
                    in_cats.insert(TagCategory::Number);
                    in_cats.insert(TagCategory::Gender);
                }
                let out_cats: BTreeSet<TagCategory> = spans
                    .iter()
                    .filter(|x| {
                        x.rownum == span.rownum
                            && !x.expanded
                            && (x.start < start || x.end() > end)
                    })
                    .flat_map(|x| tagset_cats(&x.tagsets, vocab))
                    .collect();
                let mut narrowed: Tagset = Vec::new();
                for ts in &tagsets {
                    let kept: Vec<String> = ts
                        .iter()
                        .filter(|t| {
                            let cat =
                                vocab.category(t).unwrap_or(TagCategory::Misc);
                            out_cats.contains(&cat)
                        })
                        .cloned()
                        .collect();
                    if !narrowed.contains(&kept) {
                        narrowed.push(kept);
                    }
                }
                tagsets = narrowed;
            }
        }

        // Headers at the same column position on earlier rows
        let key = (span.start, span.colspan);
        if used_keys.contains(&key) {
            match policy.reuse_cellspan {
                SpanReuse::Stop => break,
                SpanReuse::Skip => continue,
                SpanReuse::Reuse => {}
            }
        }
        let tcats = tagset_cats(&tagsets, vocab);
        // Register headers do not block their column position for rows
        // above
        if tcats.len() != 1 || !tcats.contains(&TagCategory::Register) {
            used_keys.insert(key);
        }

        // Crossing into a new row folds the accumulated row tags into the
        // column tags
        if row_tagsets_rownum != span.rownum {
            coltags = and_tagsets(policy, vocab, &coltags, &row_tagsets);
            row_tagsets = empty_tagset();
            row_tagsets_rownum = span.rownum;
        }

        if span.all_headers_row && span.rownum + 1 == last_header_row {
            // All-header row directly above the last accepted one; its
            // headers refine rather than conflict
            row_tagsets = and_tagsets(policy, vocab, &row_tagsets, &tagsets);
        } else {
            let new_cats = tagset_cats(&tagsets, vocab);
            let cur_cats = tagset_cats(&coltags, vocab);
            if new_cats.contains(&TagCategory::Detail) {
                if coltags.iter().all(|c| c.is_empty()) {
                    coltags = or_tagsets(policy, vocab, &coltags, &tagsets);
                }
                break;
            } else if cur_cats.contains(&TagCategory::NonFinite)
                && new_cats.contains(&TagCategory::NonFinite)
            {
                if policy.stop_non_finite_non_finite {
                    break;
                }
            } else if cur_cats.contains(&TagCategory::NonFinite)
                && new_cats.contains(&TagCategory::Voice)
            {
                if policy.stop_non_finite_voice {
                    break;
                }
            } else if new_cats.contains(&TagCategory::NonFinite)
                && (cur_cats.contains(&TagCategory::Person)
                    || cur_cats.contains(&TagCategory::Number))
            {
                break;
            } else if new_cats.contains(&TagCategory::NonFinite)
                && new_cats.contains(&TagCategory::Tense)
            {
                if policy.stop_non_finite_tense {
                    break;
                }
            } else if cur_cats.contains(&TagCategory::NonFinite)
                && new_cats.contains(&TagCategory::Mood)
            {
                break;
            }

            let has_imperative = coltags
                .iter()
                .any(|c| c.iter().any(|t| t == "imperative"));
            let all_new_in_cur = tagsets.iter().all(|ts| {
                ts.iter()
                    .all(|t| coltags.iter().all(|cur| cur.contains(t)))
            });
            if new_cats.contains(&TagCategory::Tense)
                && has_imperative
                && policy.imperative_no_tense
            {
                continue 'scan;
            } else if new_cats.contains(&TagCategory::Mood)
                && cur_cats.contains(&TagCategory::Mood)
                && !all_new_in_cur
            {
                if !policy.skip_mood_mood {
                    break;
                }
            } else if new_cats.contains(&TagCategory::Tense)
                && cur_cats.contains(&TagCategory::Tense)
            {
                if !policy.skip_tense_tense {
                    break;
                }
            } else if new_cats.contains(&TagCategory::Aspect)
                && cur_cats.contains(&TagCategory::Aspect)
            {
                continue 'scan;
            } else if new_cats.contains(&TagCategory::Number)
                && cur_cats.contains(&TagCategory::Number)
            {
                break;
            } else if new_cats.contains(&TagCategory::Gender)
                && cur_cats.contains(&TagCategory::Number)
            {
                break;
            } else if new_cats.contains(&TagCategory::Person)
                && cur_cats.contains(&TagCategory::Person)
            {
                break;
            } else {
                row_tagsets = and_tagsets(policy, vocab, &row_tagsets, &tagsets);
            }
        }
        last_header_row = span.rownum;
    }
    and_tagsets(policy, vocab, &coltags, &row_tagsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(rownum: usize, start: usize, colspan: usize, tags: &[&str]) -> HeaderSpan {
        HeaderSpan {
            start,
            colspan,
            rowspan: 1,
            rownum,
            tagsets: vec![tags.iter().map(|t| t.to_string()).collect()],
            text: tags.join(" "),
            all_headers_row: false,
            expanded: false,
        }
    }

    fn compute(spans: &[HeaderSpan], start: usize, colspan: usize) -> Tagset {
        compute_cell_tags(
            &LangPolicy::default(),
            &TagVocab::builtin(),
            spans,
            start,
            colspan,
        )
    }

    #[test]
    fn test_single_column_header() {
        let spans = vec![span(0, 1, 1, &["singular"]), span(0, 2, 1, &["plural"])];
        assert_eq!(compute(&spans, 1, 1), vec![vec!["singular".to_string()]]);
        assert_eq!(compute(&spans, 2, 1), vec![vec!["plural".to_string()]]);
    }

    #[test]
    fn test_rows_combine() {
        // "present" spanning both columns, "singular"/"plural" below it
        let spans = vec![
            span(0, 1, 2, &["present"]),
            span(1, 1, 1, &["singular"]),
            span(1, 2, 1, &["plural"]),
        ];
        assert_eq!(
            compute(&spans, 1, 1),
            vec![vec!["present".to_string(), "singular".to_string()]]
        );
    }

    #[test]
    fn test_partial_overlap_stops_scan() {
        // A narrower header on an earlier row sticks out of the cell's
        // left edge; nothing above it applies
        let spans = vec![
            span(0, 0, 2, &["past"]),
            span(1, 1, 2, &["singular"]),
        ];
        assert_eq!(compute(&spans, 1, 2), vec![vec!["singular".to_string()]]);
    }

    #[test]
    fn test_number_conflict_stops() {
        let spans = vec![
            span(0, 1, 1, &["plural"]),
            span(2, 1, 1, &["singular"]),
        ];
        assert_eq!(compute(&spans, 1, 1), vec![vec!["singular".to_string()]]);
    }

    #[test]
    fn test_tense_conflict_skip_policy() {
        // A mood header above two conflicting tense headers. The spans use
        // distinct column ranges so the position-reuse rule stays out of
        // the way and only the tense conflict decides.
        let spans = vec![
            span(0, 0, 3, &["indicative"]),
            span(1, 1, 2, &["past"]),
            span(2, 1, 1, &["present"]),
        ];
        // Default policy stops at the conflicting tense header; the mood
        // header above it is never reached
        assert_eq!(compute(&spans, 1, 1), vec![vec!["present".to_string()]]);
        // The skip policy drops the conflicting header but keeps scanning
        // upward
        let mut policy = LangPolicy::default();
        policy.skip_tense_tense = true;
        let ts = compute_cell_tags(
            &policy,
            &TagVocab::builtin(),
            &spans,
            1,
            1,
        );
        assert_eq!(
            ts,
            vec![vec!["indicative".to_string(), "present".to_string()]]
        );
    }

    #[test]
    fn test_wide_cell_merges_subspans() {
        // A cell spanning two columns whose headers are singular/plural
        // with nothing outside: the numbers cancel out
        let spans = vec![
            span(0, 1, 1, &["singular"]),
            span(0, 2, 1, &["plural"]),
        ];
        assert_eq!(compute(&spans, 1, 2), vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_wide_cell_narrowing_keeps_outside_cats() {
        // Genders inside the range, another gender outside: the inside
        // tags survive because the category distinguishes columns
        let spans = vec![
            span(0, 0, 1, &["neuter"]),
            span(0, 1, 1, &["masculine"]),
            span(0, 2, 1, &["feminine"]),
        ];
        let ts = compute(&spans, 1, 2);
        assert_eq!(
            ts,
            vec![vec!["feminine".to_string(), "masculine".to_string()]]
        );
    }

    #[test]
    fn test_same_position_reuse_skip() {
        // Same (start, colspan) on two rows; default policy skips the
        // earlier one
        let spans = vec![
            span(0, 1, 1, &["indicative"]),
            span(2, 1, 1, &["nominative"]),
        ];
        assert_eq!(compute(&spans, 1, 1), vec![vec!["nominative".to_string()]]);
    }

    #[test]
    fn test_register_does_not_block_position() {
        let spans = vec![
            span(0, 1, 1, &["nominative"]),
            span(2, 1, 1, &["formal"]),
        ];
        let ts = compute(&spans, 1, 1);
        assert_eq!(
            ts,
            vec![vec!["formal".to_string(), "nominative".to_string()]]
        );
    }

    #[test]
    fn test_determinism() {
        let spans = vec![
            span(0, 1, 2, &["indicative"]),
            span(1, 1, 1, &["singular"]),
            span(1, 2, 1, &["plural"]),
            span(3, 1, 2, &["present"]),
        ];
        let first = compute(&spans, 1, 1);
        for _ in 0..5 {
            assert_eq!(compute(&spans, 1, 1), first);
        }
    }
}

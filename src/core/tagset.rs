//! Tagset algebra
//!
//! A tagset is an ordered list of alternative tag combinations; each
//! combination is kept sorted and deduplicated. Two merge operations exist:
//! the alternative merge ([`or_tagsets`]) used when a cell offers several
//! readings, and the combine merge ([`and_tagsets`]) used when independent
//! header axes intersect on a cell.

use std::collections::BTreeSet;

use crate::data::policies::LangPolicy;
use crate::data::tags::{markers, TagCategory, TagVocab};

/// One alternative: a sorted, deduplicated list of tags.
pub type TagCombo = Vec<String>;

/// An ordered list of alternative tag combinations.
pub type Tagset = Vec<TagCombo>;

/// The tagset containing exactly the empty combination. Neutral element of
/// both merges.
pub fn empty_tagset() -> Tagset {
    vec![Vec::new()]
}

/// Build a sorted, deduplicated combination from arbitrary tags.
pub fn sorted_combo<I, S>(tags: I) -> TagCombo
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
    set.into_iter().collect()
}

fn cat_of(vocab: &TagVocab, tag: &str) -> TagCategory {
    vocab.category(tag).unwrap_or(TagCategory::Misc)
}

/// Remove tag combinations that carry no information together: mutually
/// cancelling pairs, and full coverage of a category inventory declared by
/// the language policy.
pub fn remove_useless_tags(policy: &LangPolicy, tags: &mut BTreeSet<String>) {
    if policy.animate_inanimate_remove
        && tags.contains("animate")
        && tags.contains("inanimate")
    {
        tags.remove("animate");
        tags.remove("inanimate");
    }
    if policy.virile_nonvirile_remove
        && tags.contains("virile")
        && tags.contains("nonvirile")
    {
        tags.remove("virile");
        tags.remove("nonvirile");
    }
    let inventories: [&[&str]; 6] = [
        &policy.numbers,
        policy.genders.as_deref().unwrap_or(&[]),
        &policy.voices,
        &policy.strengths,
        &policy.persons,
        &policy.definitenesses,
    ];
    for inventory in inventories {
        if !inventory.is_empty() && inventory.iter().all(|t| tags.contains(*t)) {
            for t in inventory {
                tags.remove(*t);
            }
        }
    }
}

/// Union of the categories of every tag in every combination.
pub fn tagset_cats(tagset: &Tagset, vocab: &TagVocab) -> BTreeSet<TagCategory> {
    tagset
        .iter()
        .flat_map(|combo| combo.iter())
        .map(|t| cat_of(vocab, t))
        .collect()
}

/// Alternative merge. Combinations differing in at most one category are
/// unified; others are kept as separate alternatives. Merging can cascade,
/// and the result never contains duplicate combinations.
pub fn or_tagsets(
    policy: &LangPolicy,
    vocab: &TagVocab,
    tagsets1: &Tagset,
    tagsets2: &Tagset,
) -> Tagset {
    let mut result: Tagset = Vec::new();
    for combo in tagsets1.iter().chain(tagsets2.iter()) {
        add_combo(policy, vocab, &mut result, combo.clone());
    }
    if result.is_empty() {
        result.push(Vec::new());
    }
    result
}

fn add_combo(policy: &LangPolicy, vocab: &TagVocab, result: &mut Tagset, combo: TagCombo) {
    // An empty combination merges with anything without changing it
    if combo.is_empty() {
        return;
    }
    if result.is_empty() {
        result.push(combo);
        return;
    }
    for i in 0..result.len() {
        if mergeable(vocab, &combo, &result[i]) {
            let other = result.remove(i);
            let mut merged: BTreeSet<String> =
                combo.into_iter().chain(other.into_iter()).collect();
            remove_useless_tags(policy, &mut merged);
            // Merging can enable further merging
            add_combo(policy, vocab, result, merged.into_iter().collect());
            return;
        }
    }
    if !result.contains(&combo) {
        result.push(combo);
    }
}

/// Two combinations can be unified if their per-category tag sets differ in
/// at most one category, and that category is populated on both sides.
fn mergeable(vocab: &TagVocab, tags1: &[String], tags2: &[String]) -> bool {
    let cats: BTreeSet<TagCategory> = tags1
        .iter()
        .chain(tags2.iter())
        .map(|t| cat_of(vocab, t))
        .collect();
    let mut num_differ = 0;
    for cat in cats {
        let in1: BTreeSet<&str> = tags1
            .iter()
            .filter(|t| cat_of(vocab, t) == cat)
            .map(String::as_str)
            .collect();
        let in2: BTreeSet<&str> = tags2
            .iter()
            .filter(|t| cat_of(vocab, t) == cat)
            .map(String::as_str)
            .collect();
        if in1 != in2 || in1.is_empty() || in2.is_empty() {
            num_differ += 1;
            if in1.is_empty() || in2.is_empty() {
                // A category missing on one side blocks merging outright
                num_differ += 1;
            }
        }
    }
    num_differ <= 1
}

/// Combine merge: union of every pair of combinations, one from each side,
/// without compatibility checking.
pub fn and_tagsets(
    policy: &LangPolicy,
    vocab: &TagVocab,
    tagsets1: &Tagset,
    tagsets2: &Tagset,
) -> Tagset {
    let mut result: Tagset = Vec::new();
    for tags1 in tagsets1 {
        for tags2 in tagsets2 {
            let mut merged: BTreeSet<String> =
                tags1.iter().chain(tags2.iter()).cloned().collect();
            remove_useless_tags(policy, &mut merged);
            merged.remove(markers::IGNORED_TEXT_CELL);
            let combo: TagCombo = merged.into_iter().collect();
            if !result.contains(&combo) {
                result.push(combo);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> TagVocab {
        TagVocab::builtin()
    }

    fn combo(tags: &[&str]) -> TagCombo {
        sorted_combo(tags.iter().copied())
    }

    #[test]
    fn test_or_merges_single_category_difference() {
        let policy = LangPolicy::default();
        // first-person vs second-person differ only in person
        let a = vec![combo(&["first-person", "singular"])];
        let b = vec![combo(&["second-person", "singular"])];
        let merged = or_tagsets(&policy, &vocab(), &a, &b);
        assert_eq!(
            merged,
            vec![combo(&["first-person", "second-person", "singular"])]
        );
    }

    #[test]
    fn test_or_keeps_incompatible_alternatives() {
        let policy = LangPolicy::default();
        let a = vec![combo(&["nominative", "singular"])];
        let b = vec![combo(&["genitive", "plural"])];
        let merged = or_tagsets(&policy, &vocab(), &a, &b);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_or_empty_side_is_neutral() {
        let policy = LangPolicy::default();
        let a = vec![combo(&["nominative"])];
        let merged = or_tagsets(&policy, &vocab(), &a, &empty_tagset());
        assert_eq!(merged, vec![combo(&["nominative"])]);
        let merged = or_tagsets(&policy, &vocab(), &empty_tagset(), &empty_tagset());
        assert_eq!(merged, empty_tagset());
    }

    #[test]
    fn test_or_idempotent() {
        let policy = LangPolicy::default();
        let a = vec![combo(&["nominative", "singular"]), combo(&["genitive", "plural"])];
        let merged = or_tagsets(&policy, &vocab(), &a, &a);
        assert_eq!(merged, a);
    }

    #[test]
    fn test_full_inventory_removal() {
        let policy = LangPolicy::default();
        // singular+plural covers the default number inventory
        let a = vec![combo(&["singular", "nominative"])];
        let b = vec![combo(&["plural", "nominative"])];
        let merged = or_tagsets(&policy, &vocab(), &a, &b);
        assert_eq!(merged, vec![combo(&["nominative"])]);
    }

    #[test]
    fn test_and_cross_product() {
        let policy = LangPolicy::default();
        let rows = vec![combo(&["present"]), combo(&["past"])];
        let cols = vec![combo(&["singular"])];
        let merged = and_tagsets(&policy, &vocab(), &rows, &cols);
        assert_eq!(
            merged,
            vec![combo(&["present", "singular"]), combo(&["past", "singular"])]
        );
    }

    #[test]
    fn test_and_drops_ignored_text_marker() {
        let policy = LangPolicy::default();
        let a = vec![combo(&["singular"])];
        let b = vec![combo(&[markers::IGNORED_TEXT_CELL])];
        let merged = and_tagsets(&policy, &vocab(), &a, &b);
        assert_eq!(merged, vec![combo(&["singular"])]);
    }

    #[test]
    fn test_and_associative_on_distinct_categories() {
        let policy = LangPolicy::default();
        let v = vocab();
        let a = vec![combo(&["present"])];
        let b = vec![combo(&["singular"])];
        let c = vec![combo(&["first-person"])];
        let left = and_tagsets(&policy, &v, &and_tagsets(&policy, &v, &a, &b), &c);
        let right = and_tagsets(&policy, &v, &a, &and_tagsets(&policy, &v, &b, &c));
        assert_eq!(left, right);
    }

    #[test]
    fn test_remove_useless_animate_pair() {
        let policy = LangPolicy::default();
        let mut tags: BTreeSet<String> = ["animate", "inanimate", "nominative"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        remove_useless_tags(&policy, &mut tags);
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("nominative"));
    }

    #[test]
    fn test_tagset_cats() {
        let ts = vec![combo(&["nominative", "singular"]), combo(&["past"])];
        let cats = tagset_cats(&ts, &vocab());
        assert!(cats.contains(&TagCategory::Case));
        assert!(cats.contains(&TagCategory::Number));
        assert!(cats.contains(&TagCategory::Tense));
    }
}

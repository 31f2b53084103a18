//! Language policies
//!
//! Inflection tables differ systematically between languages: which
//! category conflicts stop header inheritance, what the placeholder symbols
//! mean, whether brackets around a form carry register information, and so
//! on. All such knobs live in [`LangPolicy`]; the engine itself stays
//! language-agnostic and consults the policy it is handed.
//!
//! Policies are organized in inheritance chains ("German" refines
//! "germanic" refines "default"), resolved at lookup by applying each
//! level's patch on top of the defaults.

use fxhash::FxHashMap;

use crate::data::tags::TagCategory;

/// What to do when a later header occupies the same `(start, colspan)`
/// slot as an earlier one on a previous row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanReuse {
    /// Stop scanning earlier rows
    Stop,
    /// Ignore the earlier span and keep scanning
    #[default]
    Skip,
    /// Merge the earlier span's tags as if it did not conflict
    Reuse,
}

/// A cell text that is ignored only when the accumulated tags match.
#[derive(Debug, Clone)]
pub struct ConditionalIgnore {
    /// Tags that must all be present for the cell to be dropped
    pub tags: Vec<&'static str>,
    /// Cell texts the rule applies to
    pub texts: Vec<&'static str>,
}

/// Per-language interpretation knobs. Field defaults describe the behavior
/// for a language with no registered policy.
#[derive(Debug, Clone)]
pub struct LangPolicy {
    /// Categories a first header cell may expand into column headers
    pub hdr_expand_first: Vec<TagCategory>,
    /// Categories a continuation header cell may expand into
    pub hdr_expand_cont: Vec<TagCategory>,
    /// Drop animate+inanimate when both occur in one combination
    pub animate_inanimate_remove: bool,
    /// Drop virile+nonvirile when both occur in one combination
    pub virile_nonvirile_remove: bool,
    /// The language's full definiteness inventory
    pub definitenesses: Vec<&'static str>,
    /// The language's full gender inventory, if declared
    pub genders: Option<Vec<&'static str>>,
    /// The language's full number inventory
    pub numbers: Vec<&'static str>,
    /// The language's full person inventory
    pub persons: Vec<&'static str>,
    /// The language's full strength inventory
    pub strengths: Vec<&'static str>,
    /// The language's full voice inventory
    pub voices: Vec<&'static str>,
    /// A fully empty row clears accumulated column headers
    pub empty_row_resets: bool,
    /// Imperative rows do not inherit tense from above
    pub imperative_no_tense: bool,
    /// A bare masculine tag implies animate
    pub masc_only_animate: bool,
    /// Same-slot header reuse behavior across rows
    pub reuse_cellspan: SpanReuse,
    /// Mood conflict between rows skips instead of stopping
    pub skip_mood_mood: bool,
    /// Tense conflict between rows skips instead of stopping
    pub skip_tense_tense: bool,
    /// A non-finite header stops inheritance of earlier non-finite tags
    pub stop_non_finite_non_finite: bool,
    /// A non-finite header stops inheritance of earlier voice tags
    pub stop_non_finite_voice: bool,
    /// A non-finite header stops inheritance of earlier tense tags
    pub stop_non_finite_tense: bool,
    /// Known multi-word phrases split into fixed alternatives with tags
    pub special_phrase_splits: FxHashMap<&'static str, (Vec<&'static str>, Vec<&'static str>)>,
    /// Literal form text rewritten to a replacement plus extra tags
    pub form_replacements: FxHashMap<&'static str, (&'static str, &'static str)>,
    /// Regex cleanups applied to cell text before interpretation
    pub minor_text_cleanups: Vec<(&'static str, &'static str)>,
    /// A form in parentheses is the informal register
    pub parentheses_for_informal: bool,
    /// A form in square brackets is rare
    pub square_brackets_for_rare: bool,
    /// A form in curly brackets is archaic
    pub curly_brackets_for_archaic: bool,
    /// Reference markers with a fixed tag meaning ("vos" -> second-person …)
    pub special_references: FxHashMap<&'static str, &'static str>,
    /// Ignore a text cell in the table's top-left corner
    pub ignore_top_left_text_cell: bool,
    /// Article forms appear in their own columns and attach to the
    /// following form column
    pub articles_in_separate_columns: bool,
    /// Cells dropped only under specific accumulated tags
    pub conditionally_ignored_cells: Vec<ConditionalIgnore>,
    /// Data-cell texts that may be reinterpreted as headers
    pub cells_as_headers: Vec<&'static str>,
    /// Phrases masked before separator splitting
    pub protected_phrases: Vec<&'static str>,
    /// Promote forms with more words than the headword to
    /// multiword-construction
    pub promote_multiword: bool,
}

impl Default for LangPolicy {
    fn default() -> Self {
        Self {
            hdr_expand_first: vec![
                TagCategory::Number,
                TagCategory::Mood,
                TagCategory::Referent,
                TagCategory::Aspect,
                TagCategory::Tense,
                TagCategory::Voice,
                TagCategory::NonFinite,
                TagCategory::Case,
                TagCategory::Possession,
            ],
            hdr_expand_cont: vec![
                TagCategory::Tense,
                TagCategory::Mood,
                TagCategory::Aspect,
                TagCategory::Voice,
                TagCategory::NonFinite,
                TagCategory::Number,
                TagCategory::Person,
                TagCategory::Case,
                TagCategory::Class,
                TagCategory::Misc,
            ],
            animate_inanimate_remove: true,
            virile_nonvirile_remove: true,
            definitenesses: vec!["indefinite", "definite"],
            genders: None,
            numbers: vec!["singular", "plural"],
            persons: vec!["first-person", "second-person", "third-person"],
            strengths: vec![],
            voices: vec!["active", "passive"],
            empty_row_resets: false,
            imperative_no_tense: false,
            masc_only_animate: false,
            reuse_cellspan: SpanReuse::default(),
            skip_mood_mood: false,
            skip_tense_tense: false,
            stop_non_finite_non_finite: true,
            stop_non_finite_voice: false,
            stop_non_finite_tense: false,
            special_phrase_splits: FxHashMap::default(),
            form_replacements: FxHashMap::default(),
            minor_text_cleanups: Vec::new(),
            parentheses_for_informal: false,
            square_brackets_for_rare: false,
            curly_brackets_for_archaic: false,
            special_references: FxHashMap::default(),
            ignore_top_left_text_cell: false,
            articles_in_separate_columns: false,
            conditionally_ignored_cells: Vec::new(),
            cells_as_headers: Vec::new(),
            protected_phrases: Vec::new(),
            promote_multiword: false,
        }
    }
}

impl LangPolicy {
    /// True if this language declares `gender` as part of its gender
    /// inventory.
    pub fn has_gender(&self, gender: &str) -> bool {
        self.genders
            .as_ref()
            .map(|gs| gs.iter().any(|g| *g == gender))
            .unwrap_or(false)
    }
}

type PolicyPatch = Box<dyn Fn(&mut LangPolicy) + Send + Sync>;

struct PolicyEntry {
    parent: Option<String>,
    patch: PolicyPatch,
}

/// Registry of language policies with inheritance. Lookup walks the chain
/// from the root down, each level patching the defaults.
pub struct PolicyRegistry {
    entries: FxHashMap<String, PolicyEntry>,
}

impl PolicyRegistry {
    /// Empty registry; every lookup yields the defaults.
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Registry seeded with the built-in language groups and languages.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        register_builtin(&mut reg);
        reg
    }

    /// Register or replace a policy. `parent` names another entry whose
    /// patches apply first.
    pub fn register<F>(&mut self, name: &str, parent: Option<&str>, patch: F)
    where
        F: Fn(&mut LangPolicy) + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            PolicyEntry {
                parent: parent.map(str::to_string),
                patch: Box::new(patch),
            },
        );
    }

    /// Resolve the effective policy for a language. Unregistered languages
    /// get the defaults.
    pub fn policy_for(&self, lang: &str) -> LangPolicy {
        let mut chain = Vec::new();
        let mut cur = Some(lang);
        while let Some(name) = cur {
            match self.entries.get(name) {
                Some(entry) => {
                    chain.push(entry);
                    // Inheritance cycles would loop forever; cap the depth
                    if chain.len() > 8 {
                        break;
                    }
                    cur = entry.parent.as_deref();
                }
                None => break,
            }
        }
        let mut policy = LangPolicy::default();
        for entry in chain.iter().rev() {
            (entry.patch)(&mut policy);
        }
        policy
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn register_builtin(reg: &mut PolicyRegistry) {
    reg.register("germanic", None, |p| {
        p.strengths = vec!["strong", "weak", "mixed"];
        p.genders = Some(vec!["masculine", "feminine", "neuter"]);
    });
    reg.register("romance", None, |p| {
        p.genders = Some(vec!["masculine", "feminine"]);
        p.stop_non_finite_voice = true;
    });
    reg.register("slavic", None, |p| {
        p.genders = Some(vec!["masculine", "feminine", "neuter"]);
        p.masc_only_animate = true;
    });
    reg.register("uralic", None, |p| {
        p.genders = None;
        p.stop_non_finite_non_finite = false;
    });

    reg.register("English", Some("germanic"), |p| {
        p.promote_multiword = true;
        p.cells_as_headers = vec!["simple", "progressive", "perfect"];
    });
    reg.register("German", Some("germanic"), |p| {
        p.empty_row_resets = true;
        p.articles_in_separate_columns = true;
    });
    reg.register("Swedish", Some("germanic"), |p| {
        p.definitenesses = vec!["indefinite", "definite"];
        p.cells_as_headers = vec!["indicative", "subjunctive", "imperative"];
    });
    reg.register("Icelandic", Some("germanic"), |p| {
        p.reuse_cellspan = SpanReuse::Reuse;
    });
    reg.register("Spanish", Some("romance"), |p| {
        p.special_references.insert(
            "vos",
            "second-person singular vos-form",
        );
        p.protected_phrases = vec!["usted", "ustedes"];
    });
    reg.register("French", Some("romance"), |p| {
        p.imperative_no_tense = true;
    });
    reg.register("Latin", Some("romance"), |p| {
        p.genders = Some(vec!["masculine", "feminine", "neuter"]);
        p.stop_non_finite_tense = true;
    });
    reg.register("Russian", Some("slavic"), |p| {
        p.skip_mood_mood = true;
    });
    reg.register("Polish", Some("slavic"), |p| {
        p.numbers = vec!["singular", "plural"];
    });
    reg.register("Greek", None, |p| {
        p.parentheses_for_informal = true;
        p.square_brackets_for_rare = true;
        p.curly_brackets_for_archaic = true;
        p.genders = Some(vec!["masculine", "feminine", "neuter"]);
    });
    reg.register("Finnish", Some("uralic"), |p| {
        p.skip_tense_tense = true;
        p.ignore_top_left_text_cell = true;
    });
    reg.register("Hungarian", Some("uralic"), |p| {
        p.definitenesses = vec!["indefinite", "definite"];
    });
    reg.register("Latvian", None, |p| {
        p.reuse_cellspan = SpanReuse::Stop;
        p.genders = Some(vec!["masculine", "feminine"]);
    });
    reg.register("Swahili", None, |p| {
        p.genders = None;
        p.hdr_expand_cont.push(TagCategory::Object);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for_unknown_language() {
        let reg = PolicyRegistry::builtin();
        let p = reg.policy_for("Klingon");
        assert!(!p.empty_row_resets);
        assert_eq!(p.reuse_cellspan, SpanReuse::Skip);
    }

    #[test]
    fn test_inheritance_chain() {
        let reg = PolicyRegistry::builtin();
        let p = reg.policy_for("German");
        // From the germanic group
        assert_eq!(p.strengths, vec!["strong", "weak", "mixed"]);
        // German's own refinement
        assert!(p.empty_row_resets);
        assert!(p.articles_in_separate_columns);
        // Sibling languages do not see it
        assert!(!reg.policy_for("English").empty_row_resets);
    }

    #[test]
    fn test_runtime_override() {
        let mut reg = PolicyRegistry::builtin();
        reg.register("Estonian", Some("uralic"), |p| {
            p.skip_tense_tense = true;
        });
        let p = reg.policy_for("Estonian");
        assert!(p.skip_tense_tense);
        assert!(!p.stop_non_finite_non_finite);
    }

    #[test]
    fn test_greek_bracket_semantics() {
        let reg = PolicyRegistry::builtin();
        let p = reg.policy_for("Greek");
        assert!(p.parentheses_for_informal);
        assert!(p.square_brackets_for_rare);
        assert!(p.curly_brackets_for_archaic);
    }
}

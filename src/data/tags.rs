//! Tag vocabulary - the fixed set of grammatical tags and their categories
//!
//! Every tag the engine can emit belongs to exactly one category (number,
//! case, mood, …). Category membership drives all conflict-resolution
//! heuristics in the header span tracker and the tagset algebra. Resolution
//! failure is represented by a dedicated error tag rather than an exception,
//! so the engine degrades gracefully per cell.

use fxhash::FxHashMap;
use phf::{phf_map, phf_set};

/// The classification group a tag belongs to. Closed enum so that category
/// handling in the merge heuristics is exhaustively checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagCategory {
    Number,
    Case,
    Mood,
    Tense,
    Person,
    Gender,
    Voice,
    Aspect,
    NonFinite,
    Degree,
    Polarity,
    Possession,
    Referent,
    Definiteness,
    Strength,
    Animacy,
    Register,
    Detail,
    Class,
    Object,
    /// Internal marker tags that never surface in output
    Dummy,
    /// Resolution-failure markers
    Error,
    Misc,
}

/// Marker tags with special meaning to the engine. These are part of the
/// vocabulary so rule tables can mention them, but `dummy-*` tags are
/// stripped before records are emitted.
pub mod markers {
    /// Header text could not be resolved to tags
    pub const ERROR_UNRECOGNIZED: &str = "error-unrecognized-form";
    /// Placeholder cell matched intentionally ("-", "not used", …)
    pub const IGNORE_SKIPPED: &str = "dummy-ignore-skipped";
    /// Cell contains prose, not a form ("Note: …", "see …")
    pub const IGNORED_TEXT_CELL: &str = "dummy-ignored-text-cell";
    /// Skip this cell (or, from a title, the whole table)
    pub const SKIP_THIS: &str = "dummy-skip-this";
    /// Discard header spans above and to the right of this header
    pub const RESET_HEADERS: &str = "dummy-reset-headers";
    /// Save this header span for reuse in nested tables
    pub const STORE_SPAN: &str = "dummy-store-hdrspan";
    /// Re-activate previously stored header spans
    pub const LOAD_STORED_SPANS: &str = "dummy-load-stored-hdrspans";
    /// Drop previously stored header spans
    pub const RESET_STORED_SPANS: &str = "dummy-reset-stored-hdrspans";
    /// Tags from this header apply to every following row until reset
    pub const SECTION_HEADER: &str = "dummy-section-header";
    /// Clear the active section header
    pub const RESET_SECTION_HEADER: &str = "dummy-reset-section-header";
    /// Replace subject concord tags with object concord counterparts
    pub const OBJECT_CONCORD: &str = "dummy-object-concord";
    /// Block inheriting further mood tags without adding one
    pub const DUMMY_MOOD: &str = "dummy-mood";
    /// Block inheriting further tense tags without adding one
    pub const DUMMY_TENSE: &str = "dummy-tense";
    /// Drop the record built from this cell entirely
    pub const REMOVE_THIS_CELL: &str = "dummy-remove-this-cell";
    /// Treat the whole column below this header as headers
    pub const COLUMN_WILDCARD: &str = "*";
    /// Synthetic per-table scope marker record
    pub const TABLE_TAGS: &str = "table-tags";
    /// Synthetic record naming the invoking template
    pub const INFLECTION_TEMPLATE: &str = "inflection-template";
}

/// Cell values that are deliberate placeholders, not forms. Matching one
/// of these yields `dummy-ignore-skipped` instead of an error.
pub static IGNORED_COLVALUES: phf::Set<&'static str> = phf_set! {
    "-", "־", "᠆", "‐", "‑", "‒", "–", "—", "―", "−",
    "⸺", "⸻", "﹘", "﹣", "－",
    "/", "?",
    "not used", "not applicable",
};

/// Parts of speech recognized in rule-table `pos` conditions.
pub static PARTS_OF_SPEECH: phf::Set<&'static str> = phf_set! {
    "noun", "verb", "adj", "adv", "pron", "det", "num", "name",
    "article", "particle", "postp", "prep", "conj", "intj",
    "suffix", "prefix", "phrase", "proverb", "contraction",
};

static BUILTIN_TAGS: phf::Map<&'static str, TagCategory> = phf_map! {
    // Number
    "singular" => TagCategory::Number,
    "plural" => TagCategory::Number,
    "dual" => TagCategory::Number,
    "trial" => TagCategory::Number,
    "paucal" => TagCategory::Number,
    "collective" => TagCategory::Number,
    "singulative" => TagCategory::Number,
    "no-plural" => TagCategory::Number,
    // Case
    "nominative" => TagCategory::Case,
    "accusative" => TagCategory::Case,
    "genitive" => TagCategory::Case,
    "dative" => TagCategory::Case,
    "instrumental" => TagCategory::Case,
    "ablative" => TagCategory::Case,
    "locative" => TagCategory::Case,
    "vocative" => TagCategory::Case,
    "prepositional" => TagCategory::Case,
    "illative" => TagCategory::Case,
    "elative" => TagCategory::Case,
    "inessive" => TagCategory::Case,
    "adessive" => TagCategory::Case,
    "allative" => TagCategory::Case,
    "essive" => TagCategory::Case,
    "translative" => TagCategory::Case,
    "partitive" => TagCategory::Case,
    "abessive" => TagCategory::Case,
    "comitative" => TagCategory::Case,
    "instructive" => TagCategory::Case,
    "terminative" => TagCategory::Case,
    "ergative" => TagCategory::Case,
    "absolutive" => TagCategory::Case,
    "oblique" => TagCategory::Case,
    "direct" => TagCategory::Case,
    // Mood
    "indicative" => TagCategory::Mood,
    "subjunctive" => TagCategory::Mood,
    "imperative" => TagCategory::Mood,
    "conditional" => TagCategory::Mood,
    "optative" => TagCategory::Mood,
    "jussive" => TagCategory::Mood,
    "potential" => TagCategory::Mood,
    "quotative" => TagCategory::Mood,
    "interrogative" => TagCategory::Mood,
    "dummy-mood" => TagCategory::Mood,
    // Tense
    "present" => TagCategory::Tense,
    "past" => TagCategory::Tense,
    "future" => TagCategory::Tense,
    "imperfect" => TagCategory::Tense,
    "perfect" => TagCategory::Tense,
    "pluperfect" => TagCategory::Tense,
    "preterite" => TagCategory::Tense,
    "aorist" => TagCategory::Tense,
    "future-perfect" => TagCategory::Tense,
    "dummy-tense" => TagCategory::Tense,
    // Person
    "first-person" => TagCategory::Person,
    "second-person" => TagCategory::Person,
    "third-person" => TagCategory::Person,
    "impersonal" => TagCategory::Person,
    // Gender
    "masculine" => TagCategory::Gender,
    "feminine" => TagCategory::Gender,
    "neuter" => TagCategory::Gender,
    "common-gender" => TagCategory::Gender,
    // Voice
    "active" => TagCategory::Voice,
    "passive" => TagCategory::Voice,
    "middle" => TagCategory::Voice,
    "mediopassive" => TagCategory::Voice,
    "reflexive" => TagCategory::Voice,
    "causative" => TagCategory::Voice,
    // Aspect
    "perfective" => TagCategory::Aspect,
    "imperfective" => TagCategory::Aspect,
    "progressive" => TagCategory::Aspect,
    "habitual" => TagCategory::Aspect,
    "momentane" => TagCategory::Aspect,
    // Non-finite
    "infinitive" => TagCategory::NonFinite,
    "infinitive-i" => TagCategory::NonFinite,
    "infinitive-i-long" => TagCategory::NonFinite,
    "infinitive-ii" => TagCategory::NonFinite,
    "infinitive-iii" => TagCategory::NonFinite,
    "infinitive-iv" => TagCategory::NonFinite,
    "infinitive-v" => TagCategory::NonFinite,
    "participle" => TagCategory::NonFinite,
    "gerund" => TagCategory::NonFinite,
    "supine" => TagCategory::NonFinite,
    "gerundive" => TagCategory::NonFinite,
    "verbal-noun" => TagCategory::NonFinite,
    "connegative" => TagCategory::NonFinite,
    "agentive" => TagCategory::NonFinite,
    // Degree
    "positive" => TagCategory::Degree,
    "comparative" => TagCategory::Degree,
    "superlative" => TagCategory::Degree,
    // Polarity
    "affirmative" => TagCategory::Polarity,
    "negative" => TagCategory::Polarity,
    // Possession
    "possessive" => TagCategory::Possession,
    "possessed-single" => TagCategory::Possession,
    "possessed-many" => TagCategory::Possession,
    // Referent
    "proximal" => TagCategory::Referent,
    "distal" => TagCategory::Referent,
    // Definiteness
    "definite" => TagCategory::Definiteness,
    "indefinite" => TagCategory::Definiteness,
    "construct" => TagCategory::Definiteness,
    "without-article" => TagCategory::Definiteness,
    "usually-without-article" => TagCategory::Definiteness,
    "includes-article" => TagCategory::Definiteness,
    // Strength
    "strong" => TagCategory::Strength,
    "weak" => TagCategory::Strength,
    "mixed" => TagCategory::Strength,
    // Animacy
    "animate" => TagCategory::Animacy,
    "inanimate" => TagCategory::Animacy,
    "virile" => TagCategory::Animacy,
    "nonvirile" => TagCategory::Animacy,
    // Register
    "formal" => TagCategory::Register,
    "informal" => TagCategory::Register,
    "colloquial" => TagCategory::Register,
    "literary" => TagCategory::Register,
    "polite" => TagCategory::Register,
    "familiar" => TagCategory::Register,
    "vulgar" => TagCategory::Register,
    "euphemistic" => TagCategory::Register,
    // Detail
    "emphatic" => TagCategory::Detail,
    "stressed" => TagCategory::Detail,
    "unstressed" => TagCategory::Detail,
    "short-form" => TagCategory::Detail,
    "long-form" => TagCategory::Detail,
    "contracted" => TagCategory::Detail,
    "uncontracted" => TagCategory::Detail,
    // Class
    "class" => TagCategory::Class,
    "class-1" => TagCategory::Class,
    "class-2" => TagCategory::Class,
    "class-3" => TagCategory::Class,
    "class-4" => TagCategory::Class,
    "class-5" => TagCategory::Class,
    "class-6" => TagCategory::Class,
    "class-7" => TagCategory::Class,
    "class-8" => TagCategory::Class,
    "class-9" => TagCategory::Class,
    "class-10" => TagCategory::Class,
    "class-11" => TagCategory::Class,
    "class-12" => TagCategory::Class,
    "class-13" => TagCategory::Class,
    "class-14" => TagCategory::Class,
    "class-15" => TagCategory::Class,
    "class-16" => TagCategory::Class,
    "class-17" => TagCategory::Class,
    "class-18" => TagCategory::Class,
    "declension-1" => TagCategory::Class,
    "declension-2" => TagCategory::Class,
    "declension-3" => TagCategory::Class,
    "declension-4" => TagCategory::Class,
    "declension-5" => TagCategory::Class,
    "declension-6" => TagCategory::Class,
    "conjugation-1" => TagCategory::Class,
    "conjugation-2" => TagCategory::Class,
    "conjugation-3" => TagCategory::Class,
    "conjugation-4" => TagCategory::Class,
    "conjugation-5" => TagCategory::Class,
    "conjugation-6" => TagCategory::Class,
    "conjugation-7" => TagCategory::Class,
    "accent-paradigm" => TagCategory::Class,
    // Object concord
    "object-first-person" => TagCategory::Object,
    "object-second-person" => TagCategory::Object,
    "object-third-person" => TagCategory::Object,
    "object-singular" => TagCategory::Object,
    "object-plural" => TagCategory::Object,
    "object-definite" => TagCategory::Object,
    "object-indefinite" => TagCategory::Object,
    "object-masculine" => TagCategory::Object,
    "object-feminine" => TagCategory::Object,
    // Internal markers
    "dummy-ignore-skipped" => TagCategory::Dummy,
    "dummy-ignored-text-cell" => TagCategory::Dummy,
    "dummy-skip-this" => TagCategory::Dummy,
    "dummy-reset-headers" => TagCategory::Dummy,
    "dummy-store-hdrspan" => TagCategory::Dummy,
    "dummy-load-stored-hdrspans" => TagCategory::Dummy,
    "dummy-reset-stored-hdrspans" => TagCategory::Dummy,
    "dummy-section-header" => TagCategory::Dummy,
    "dummy-reset-section-header" => TagCategory::Dummy,
    "dummy-object-concord" => TagCategory::Dummy,
    "dummy-remove-this-cell" => TagCategory::Dummy,
    "*" => TagCategory::Dummy,
    "table-tags" => TagCategory::Dummy,
    "inflection-template" => TagCategory::Dummy,
    // Errors
    "error-unrecognized-form" => TagCategory::Error,
    // Miscellaneous word-level tags
    "archaic" => TagCategory::Misc,
    "dated" => TagCategory::Misc,
    "obsolete" => TagCategory::Misc,
    "rare" => TagCategory::Misc,
    "dialectal" => TagCategory::Misc,
    "nonstandard" => TagCategory::Misc,
    "countable" => TagCategory::Misc,
    "uncountable" => TagCategory::Misc,
    "transitive" => TagCategory::Misc,
    "intransitive" => TagCategory::Misc,
    "ditransitive" => TagCategory::Misc,
    "ambitransitive" => TagCategory::Misc,
    "deponent" => TagCategory::Misc,
    "irregular" => TagCategory::Misc,
    "auxiliary" => TagCategory::Misc,
    "clitic" => TagCategory::Misc,
    "pronoun" => TagCategory::Misc,
    "personal" => TagCategory::Misc,
    "personal-pronoun" => TagCategory::Misc,
    "subjective" => TagCategory::Misc,
    "objective" => TagCategory::Misc,
    "predicative" => TagCategory::Misc,
    "attributive" => TagCategory::Misc,
    "mutation" => TagCategory::Misc,
    "mutation-soft" => TagCategory::Misc,
    "mutation-mixed" => TagCategory::Misc,
    "mutation-aspirate" => TagCategory::Misc,
    "mutation-nasal" => TagCategory::Misc,
    "combined-form" => TagCategory::Misc,
    "multiword-construction" => TagCategory::Misc,
    "subordinate-clause" => TagCategory::Misc,
    "proper-noun" => TagCategory::Misc,
    "separable" => TagCategory::Misc,
    "no-supine" => TagCategory::Misc,
    "no-perfect" => TagCategory::Misc,
    "no-short-form" => TagCategory::Misc,
    "participle-1" => TagCategory::Misc,
    "participle-2" => TagCategory::Misc,
    "noun" => TagCategory::Misc,
    "adjectival" => TagCategory::Misc,
    "adverbial" => TagCategory::Misc,
};

/// The validated tag vocabulary. Seeded from the built-in grammatical tag
/// set; languages and deployments may register additional tags.
#[derive(Debug, Clone, Default)]
pub struct TagVocab {
    extra: FxHashMap<String, TagCategory>,
}

impl TagVocab {
    /// Vocabulary containing only the built-in tags.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Register an additional tag. Extensions are additive; built-in tags
    /// cannot be recategorized.
    pub fn insert(&mut self, tag: impl Into<String>, category: TagCategory) {
        let tag = tag.into();
        if !BUILTIN_TAGS.contains_key(tag.as_str()) {
            self.extra.insert(tag, category);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        BUILTIN_TAGS.contains_key(tag) || self.extra.contains_key(tag)
    }

    /// Category of a tag, or None for tags outside the vocabulary.
    pub fn category(&self, tag: &str) -> Option<TagCategory> {
        BUILTIN_TAGS
            .get(tag)
            .copied()
            .or_else(|| self.extra.get(tag).copied())
    }
}

//! Built-in header resolution rules
//!
//! A representative rule table covering the header vocabulary of common
//! inflection tables. Deployments with bigger needs load additional rules
//! from JSON (`data-loading` feature); the built-in table is enough for the
//! covered languages and keeps the engine usable with no external data.

use lazy_static::lazy_static;

use crate::core::rules::{Decision, IfTags, RuleNode, RuleTable};
use crate::data::tags::markers;

// Headers that map directly to tags. Both the listed form and the
// capitalized form are registered.
static SIMPLE_RULES: &[(&str, &str)] = &[
    // Number
    ("singular", "singular"),
    ("plural", "plural"),
    ("dual", "dual"),
    ("sg.", "singular"),
    ("pl.", "plural"),
    // Case
    ("nominative", "nominative"),
    ("accusative", "accusative"),
    ("genitive", "genitive"),
    ("dative", "dative"),
    ("instrumental", "instrumental"),
    ("ablative", "ablative"),
    ("locative", "locative"),
    ("vocative", "vocative"),
    ("prepositional", "prepositional"),
    ("illative", "illative"),
    ("elative", "elative"),
    ("inessive", "inessive"),
    ("adessive", "adessive"),
    ("allative", "allative"),
    ("essive", "essive"),
    ("translative", "translative"),
    ("partitive", "partitive"),
    ("abessive", "abessive"),
    ("comitative", "comitative"),
    ("instructive", "instructive"),
    ("oblique", "oblique"),
    // Person
    ("first person", "first-person"),
    ("second person", "second-person"),
    ("third person", "third-person"),
    ("1st person", "first-person"),
    ("2nd person", "second-person"),
    ("3rd person", "third-person"),
    ("first-person singular", "first-person singular"),
    ("second-person singular", "second-person singular"),
    ("third-person singular", "third-person singular"),
    ("first-person plural", "first-person plural"),
    ("second-person plural", "second-person plural"),
    ("third-person plural", "third-person plural"),
    ("impersonal", "impersonal"),
    // Gender
    ("masculine", "masculine"),
    ("feminine", "feminine"),
    ("neuter", "neuter"),
    ("m", "masculine"),
    ("f", "feminine"),
    ("n", "neuter"),
    // Tense
    ("present", "present"),
    ("past", "past"),
    ("future", "future"),
    ("imperfect", "imperfect"),
    ("perfect", "perfect"),
    ("pluperfect", "pluperfect"),
    ("preterite", "preterite"),
    ("aorist", "aorist"),
    ("future perfect", "future-perfect"),
    ("present tense", "present"),
    ("past tense", "past"),
    ("future tense", "future"),
    // Mood
    ("indicative", "indicative"),
    ("subjunctive", "subjunctive"),
    ("imperative", "imperative"),
    ("conditional", "conditional"),
    ("optative", "optative"),
    ("potential", "potential"),
    ("jussive", "jussive"),
    ("indicative mood", "indicative"),
    ("subjunctive mood", "subjunctive"),
    ("imperative mood", "imperative"),
    ("present indicative", "present indicative"),
    ("past indicative", "past indicative"),
    ("present subjunctive", "present subjunctive"),
    ("past subjunctive", "past subjunctive"),
    // Non-finite
    ("infinitive", "infinitive"),
    ("gerund", "gerund"),
    ("supine", "supine"),
    ("gerundive", "gerundive"),
    ("participle", "participle"),
    ("participles", "participle"),
    ("present participle", "participle present"),
    ("past participle", "participle past"),
    ("passive participle", "participle passive"),
    ("active participle", "participle active"),
    ("verbal noun", "verbal-noun"),
    ("verbal nouns", "verbal-noun"),
    ("connegative", "connegative"),
    ("agent noun", "agentive"),
    // Degree
    ("positive", "positive"),
    ("comparative", "comparative"),
    ("superlative", "superlative"),
    // Voice
    ("active", "active"),
    ("passive", "passive"),
    ("middle", "middle"),
    ("mediopassive", "mediopassive"),
    ("active voice", "active"),
    ("passive voice", "passive"),
    // Aspect
    ("perfective", "perfective"),
    ("imperfective", "imperfective"),
    ("progressive", "progressive"),
    ("perfective aspect", "perfective"),
    ("imperfective aspect", "imperfective"),
    // Polarity
    ("affirmative", "affirmative"),
    ("negative", "negative"),
    // Definiteness
    ("definite", "definite"),
    ("indefinite", "indefinite"),
    ("construct", "construct"),
    ("definite accusative", "definite accusative"),
    // Strength
    ("strong", "strong"),
    ("weak", "weak"),
    ("mixed", "mixed"),
    ("strong declension", "strong"),
    ("weak declension", "weak"),
    ("mixed declension", "mixed"),
    // Animacy
    ("animate", "animate"),
    ("inanimate", "inanimate"),
    ("virile", "virile"),
    ("nonvirile", "nonvirile"),
    // Register
    ("formal", "formal"),
    ("informal", "informal"),
    ("colloquial", "colloquial"),
    ("literary", "literary"),
    ("polite", "polite"),
    ("familiar", "familiar"),
    // Other
    ("attributive", "attributive"),
    ("predicative", "predicative"),
    ("reflexive", "reflexive"),
    ("possessive", "possessive"),
    ("possessive forms", "possessive"),
    ("stressed", "stressed"),
    ("unstressed", "unstressed"),
    ("contracted", "contracted"),
    ("long form", "long-form"),
    ("combined forms", "combined-form"),
    ("mutation", "mutation"),
    ("soft mutation", "mutation-soft"),
    ("nasal mutation", "mutation-nasal"),
    ("aspirate mutation", "mutation-aspirate"),
    // Whole-column header markers
    ("case", "*"),
    ("case / gender", "*"),
    ("number & gender", "*"),
    ("mutation type", "*"),
];

// Headers that match as a prefix; the remainder of the header is consumed.
static PREFIX_RULES: &[(&str, &str)] = &[
    ("with infinitive", "infinitive"),
    ("with gerund", "gerund"),
    ("with informal second-person singular imperative",
     "informal second-person singular imperative"),
    ("with formal second-person singular imperative",
     "formal second-person singular imperative"),
    ("with first-person plural imperative", "first-person plural imperative"),
    ("with informal second-person plural imperative",
     "informal second-person plural imperative"),
    ("with formal second-person plural imperative",
     "formal second-person plural imperative"),
    ("Soft mutation after", "mutation-soft"),
    ("Mixed mutation after", "mutation-mixed"),
    ("Initial mutations of a following adjective:", "dummy-skip-this"),
];

// Headers offering several readings.
static ALT_RULES: &[(&str, &[&str])] = &[
    ("masc./fem.", &["masculine", "feminine"]),
    ("masculine/feminine", &["masculine", "feminine"]),
    ("m / f", &["masculine", "feminine"]),
    ("singular/plural", &["singular", "plural"]),
    ("m./n.", &["masculine", "neuter"]),
    ("second/third-person", &["second-person", "third-person"]),
];

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn build() -> RuleTable {
    let mut table = RuleTable::new();
    for (key, tags) in SIMPLE_RULES {
        table.insert(key, RuleNode::literal(tags));
        let cap = capitalize(key);
        if cap != *key {
            table.insert(&cap, RuleNode::literal(tags));
        }
    }
    for (key, tags) in PREFIX_RULES {
        table.insert_prefix(key, RuleNode::literal(tags));
    }
    for (key, alts) in ALT_RULES {
        table.insert(key, RuleNode::alternatives(alts));
        let cap = capitalize(key);
        if cap != *key {
            table.insert(&cap, RuleNode::alternatives(alts));
        }
    }

    // "simple" adds a tense only when the row does not carry one already
    table.insert(
        "simple",
        RuleNode::Decision(Box::new(Decision {
            if_tags: Some(IfTags::parse("any: present past future")),
            then: Some(RuleNode::Literal(String::new())),
            else_: Some(RuleNode::literal("present")),
            ..Decision::default()
        })),
    );
    // Short forms exist only for languages that distinguish them
    table.insert(
        "short form",
        RuleNode::Decision(Box::new(Decision {
            lang: Some(vec!["Russian".to_string(), "Bulgarian".to_string(),
                            "Macedonian".to_string()]),
            then: Some(RuleNode::literal("short-form")),
            else_: Some(RuleNode::literal(markers::ERROR_UNRECOGNIZED)),
            ..Decision::default()
        })),
    );
    // "singular" column of a possessive sub-table refers to the possessor
    table.insert(
        "singular possessor",
        RuleNode::Decision(Box::new(Decision {
            if_tags: Some(IfTags::parse("possessive")),
            then: Some(RuleNode::literal("possessive singular")),
            else_: Some(RuleNode::literal("singular")),
            ..Decision::default()
        })),
    );
    table.insert(
        "plural possessor",
        RuleNode::Decision(Box::new(Decision {
            if_tags: Some(IfTags::parse("possessive")),
            then: Some(RuleNode::literal("possessive plural")),
            else_: Some(RuleNode::literal("plural")),
            ..Decision::default()
        })),
    );
    // Nominal vs verbal reading of the same header text
    table.insert(
        "perfect forms",
        RuleNode::Decision(Box::new(Decision {
            pos: Some(vec!["verb".to_string()]),
            then: Some(RuleNode::literal("perfect multiword-construction")),
            else_: Some(RuleNode::literal("perfect")),
            ..Decision::default()
        })),
    );
    table
}

lazy_static! {
    static ref BUILTIN: RuleTable = build();
}

/// The built-in rule table.
pub fn builtin_rules() -> &'static RuleTable {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tags::TagVocab;

    #[test]
    fn test_builtin_table_validates() {
        builtin_rules().validate(&TagVocab::builtin()).unwrap();
    }

    #[test]
    fn test_capitalized_variants_registered() {
        let table = builtin_rules();
        assert!(table.contains("singular"));
        assert!(table.contains("Singular"));
        assert!(table.contains("present indicative"));
        assert!(table.contains("Present indicative"));
    }

    #[test]
    fn test_size_sanity() {
        assert!(builtin_rules().len() > 200);
    }
}

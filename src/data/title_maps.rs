//! Static keyword maps for table title and caption interpretation
//!
//! Table titles ("Conjugation of foo (strong verb, class 3)") carry
//! information about every form in the table. These maps translate title
//! fragments into tags; the title parser in `features::title` drives them.

use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;

/// Phrases anywhere in a title that add tags to every form extracted from
/// the table. Values are space-separated tags.
pub static TITLE_CONTAINS_GLOBAL: phf::Map<&'static str, &'static str> = phf_map! {
    "impersonal" => "impersonal",
    "negative" => "negative",
    "definite" => "definite",
    "indefinite" => "indefinite",
    "perfective aspect" => "perfective",
    "imperfective aspect" => "imperfective",
    "passive voice" => "passive",
    "active voice" => "active",
    "reflexive" => "reflexive",
    "archaic" => "archaic",
    "dated" => "dated",
    "combined forms" => "combined-form",
};

/// Phrases anywhere in a title that describe the headword itself rather
/// than individual forms. These end up on the table-scope record.
pub static TITLE_CONTAINS_WORDTAGS: phf::Map<&'static str, &'static str> = phf_map! {
    "strong verb" => "strong",
    "strong noun" => "strong",
    "weak verb" => "weak",
    "weak noun" => "weak",
    "irregular verb" => "irregular",
    "irregular" => "irregular",
    "auxiliary verb" => "auxiliary",
    "transitive verb" => "transitive",
    "intransitive verb" => "intransitive",
    "countable" => "countable",
    "uncountable" => "uncountable",
    "animate" => "animate",
    "inanimate" => "inanimate",
    "masculine" => "masculine",
    "feminine" => "feminine",
    "neuter" => "neuter",
    "deponent" => "deponent",
    "separable" => "separable",
    "no supine stem" => "no-supine",
    "no perfect stem" => "no-perfect",
};

/// Whole comma-separated title elements, usually inside parentheses, that
/// translate to headword tags.
pub static TITLE_ELEMENTS: phf::Map<&'static str, &'static str> = phf_map! {
    "singular" => "singular",
    "plural" => "plural",
    "masculine" => "masculine",
    "feminine" => "feminine",
    "neuter" => "neuter",
    "animate" => "animate",
    "inanimate" => "inanimate",
    "perfective" => "perfective",
    "imperfective" => "imperfective",
    "transitive" => "transitive",
    "intransitive" => "intransitive",
    "reflexive" => "reflexive",
    "strong" => "strong",
    "weak" => "weak",
    "mixed" => "mixed",
    "irregular" => "irregular",
};

/// First words of a title element whose remainder names an inflection
/// class; the whole element becomes a `class` form.
pub static TITLE_ELEMSTART: phf::Map<&'static str, &'static str> = phf_map! {
    "class" => "class",
    "type" => "class",
    "accent" => "class",
    "accent paradigm" => "accent-paradigm",
    "stem" => "class",
    "pattern" => "class",
    "group" => "class",
    "declension" => "class",
    "conjugation" => "class",
    "gradation" => "class",
};

lazy_static! {
    /// Header cell texts that are really table titles, not column headers.
    pub static ref TITLE_HDR_RE: Regex = Regex::new(
        r"(?i)^\s*(conjugation|declension|inflection|mutation)\s+of\b"
    ).unwrap();

    /// Title element suffixes that name an inflection class on their own.
    pub static ref CLASS_FRAGMENT_RE: Regex = Regex::new(
        r"(?x)
        ( -type \b
        | -stem \b
        | \b gradation \b
        | \b harmony \b
        | \b \d+ (?: st | nd | rd | th )? \s+ (?: declension | conjugation ) \b
        )"
    ).unwrap();

    /// Titles that mark the whole table as not applicable to the headword.
    pub static ref SKIP_TABLE_TITLE_RE: Regex = Regex::new(
        r"(?i)\b(variation of|historical inflection of)\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_map() {
        assert_eq!(TITLE_CONTAINS_GLOBAL.get("impersonal"), Some(&"impersonal"));
        assert!(TITLE_CONTAINS_GLOBAL.get("strong verb").is_none());
    }

    #[test]
    fn test_title_hdr_re() {
        assert!(TITLE_HDR_RE.is_match("Conjugation of sein"));
        assert!(TITLE_HDR_RE.is_match("  declension of kissa (Kotus type 9)"));
        assert!(!TITLE_HDR_RE.is_match("present indicative"));
    }

    #[test]
    fn test_class_fragment_re() {
        assert!(CLASS_FRAGMENT_RE.is_match("kala-type"));
        assert!(CLASS_FRAGMENT_RE.is_match("consonant gradation"));
        assert!(CLASS_FRAGMENT_RE.is_match("3rd declension"));
        assert!(!CLASS_FRAGMENT_RE.is_match("present tense"));
    }

    #[test]
    fn test_skip_table_title() {
        assert!(SKIP_TABLE_TITLE_RE.is_match("Pre-1950 variation of foo"));
        assert!(!SKIP_TABLE_TITLE_RE.is_match("Declension of foo"));
    }
}

//! Table title interpretation
//!
//! Titles like "Conjugation of laufen (class 6 strong verb)" describe the
//! whole table: some words add tags to every extracted form, some describe
//! the headword itself, and some name an inflection class that becomes its
//! own record. The keyword maps live in `data::title_maps`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::data::title_maps::{
    CLASS_FRAGMENT_RE, SKIP_TABLE_TITLE_RE, TITLE_CONTAINS_GLOBAL,
    TITLE_CONTAINS_WORDTAGS, TITLE_ELEMENTS, TITLE_ELEMSTART,
};

lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"(?i)<[^>]*>").unwrap();
    static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref PAREN_RE: Regex = Regex::new(r"\(([^)]*)\)").unwrap();
    static ref REFLEXIVE_FRENCH_RE: Regex =
        Regex::new(r"Conjugation of (s’|se ).*French verbs").unwrap();
    static ref CLASS_RE: Regex = Regex::new(
        r"(?x)\b(
          [\w/]+-type
        | accent-\w+
        | [\w/]+-stem
        | [^\ ]+\ gradation
        | stem\ in\ [\w/\ ]+
        | [^\ ]+\ alternation
        | (?:First|Second|Third|Fourth|Fifth|Sixth|Seventh)\ (?:Conjugation|declension)
        | First\ and\ second\ declension
        | (?:1st|2nd|3rd|4th|5th|6th)\ declension
        | \w[\w/\ ]*\ harmony
        )\b"
    ).unwrap();
    static ref PORTUGUESE_CLASS_RE: Regex =
        Regex::new(r"\b(Portuguese) (-.* verb) ").unwrap();
}

/// What a table title contributes to the interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleContribution {
    /// Tags added to every form extracted from the table
    pub global_tags: Vec<String>,
    /// Tags describing the headword, reported on the table-scope record
    pub table_tags: Vec<String>,
    /// Additional records, typically inflection classes: (form, tags)
    pub extra_forms: Vec<(String, Vec<String>)>,
    /// The title marks the whole table as not applying to the headword
    pub skip_table: bool,
}

fn push_unique(out: &mut Vec<String>, tags: &str) {
    for tag in tags.split_whitespace() {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
}

// True when `key` occurs in `text` bounded by non-alphanumeric characters,
// so "definite" does not match inside "indefinite"
fn contains_phrase(text: &str, key: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = text[start..].find(key) {
        let abs = start + pos;
        let before_ok = text[..abs]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let after_ok = text[abs + key.len()..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        if before_ok && after_ok {
            return true;
        }
        start = abs + key.len();
    }
    false
}

fn elemstart_split(elem: &str) -> Option<(&'static str, &str)> {
    let mut best: Option<(&'static str, &'static str)> = None;
    for (key, tags) in TITLE_ELEMSTART.entries() {
        if elem.len() > key.len()
            && elem.starts_with(key)
            && elem[key.len()..].starts_with(' ')
            && best.map(|(k, _)| key.len() > k.len()).unwrap_or(true)
        {
            best = Some((key, tags));
        }
    }
    best.map(|(key, tags)| (tags, elem[key.len()..].trim()))
}

/// Parse a table title or caption.
pub fn parse_title(title: &str) -> TitleContribution {
    let title = HTML_TAG_RE.replace_all(title, "");
    let title = WS_RE.replace_all(title.trim(), " ").into_owned();
    let lower = title.to_lowercase();
    let mut out = TitleContribution::default();

    if SKIP_TABLE_TITLE_RE.is_match(&title) {
        out.skip_table = true;
        return out;
    }

    for (key, tags) in TITLE_CONTAINS_GLOBAL.entries() {
        if contains_phrase(&lower, key) {
            push_unique(&mut out.global_tags, tags);
        }
    }
    for (key, tags) in TITLE_CONTAINS_WORDTAGS.entries() {
        if contains_phrase(&lower, key) {
            push_unique(&mut out.table_tags, tags);
        }
    }
    if REFLEXIVE_FRENCH_RE.is_match(&title) {
        push_unique(&mut out.global_tags, "reflexive");
    }

    // Inflection class fragments anywhere in the title
    for caps in CLASS_RE.captures_iter(&title) {
        if let Some(m) = caps.get(1) {
            out.extra_forms
                .push((m.as_str().to_string(), vec!["class".to_string()]));
        }
    }

    // Parenthesized, comma-separated elements
    let mut saw_paren = false;
    for caps in PAREN_RE.captures_iter(&title) {
        saw_paren = true;
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        for elem in inner.split(',') {
            let elem = elem.trim();
            if let Some(tags) = TITLE_ELEMENTS.get(elem) {
                push_unique(&mut out.table_tags, tags);
            } else if let Some((tags, rest)) = elemstart_split(elem) {
                out.extra_forms.push((
                    rest.to_string(),
                    tags.split_whitespace().map(str::to_string).collect(),
                ));
            }
        }
    }

    // Titles without parentheses still carry comma-separated elements
    if !saw_paren {
        if let Some(caps) = PORTUGUESE_CLASS_RE.captures(&title) {
            if let Some(m) = caps.get(2) {
                out.extra_forms
                    .push((m.as_str().to_string(), vec!["class".to_string()]));
            }
        }
        for elem in title.split(',') {
            let elem = elem.trim();
            if let Some(tags) = TITLE_ELEMENTS.get(elem) {
                push_unique(&mut out.table_tags, tags);
            } else if CLASS_FRAGMENT_RE.is_match(elem)
                && !out.extra_forms.iter().any(|(f, _)| f == elem)
            {
                out.extra_forms
                    .push((elem.to_string(), vec!["class".to_string()]));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_global_tags_from_title() {
        let c = parse_title("Negative conjugation of olla");
        assert_eq!(c.global_tags, vec!["negative".to_string()]);
        assert!(!c.skip_table);
    }

    #[test]
    fn test_word_boundary_in_keywords() {
        let c = parse_title("Indefinite declension of hus");
        assert_eq!(c.global_tags, vec!["indefinite".to_string()]);
    }

    #[test]
    fn test_wordtags_from_title() {
        let c = parse_title("Conjugation of laufen (irregular verb)");
        assert!(c.table_tags.contains(&"irregular".to_string()));
        assert!(c.global_tags.is_empty());
    }

    #[test]
    fn test_paren_elements() {
        let c = parse_title("Declension of hus (neuter, strong)");
        assert!(c.table_tags.contains(&"neuter".to_string()));
        assert!(c.table_tags.contains(&"strong".to_string()));
    }

    #[test]
    fn test_class_element() {
        let c = parse_title("Conjugation of binden (class 3 strong verb)");
        assert!(c
            .extra_forms
            .iter()
            .any(|(f, t)| f == "3 strong verb" && t == &vec!["class".to_string()]));
        assert!(c.table_tags.contains(&"strong".to_string()));
    }

    #[test]
    fn test_stem_class_fragment() {
        let c = parse_title("Declension of dagur (u-stem)");
        assert!(c
            .extra_forms
            .iter()
            .any(|(f, t)| f == "u-stem" && t.contains(&"class".to_string())));
    }

    #[test]
    fn test_portuguese_verb_class() {
        let c = parse_title("Portuguese -er verb conjugation");
        assert!(c.extra_forms.iter().any(|(f, _)| f == "-er verb"));
    }

    #[test]
    fn test_reflexive_french() {
        let c = parse_title("Conjugation of se laver like other French verbs");
        assert!(c.global_tags.contains(&"reflexive".to_string()));
    }

    #[test]
    fn test_skip_table() {
        let c = parse_title("Historical inflection of sche");
        assert!(c.skip_table);
        assert!(c.global_tags.is_empty());
    }

    #[test]
    fn test_html_stripped() {
        let c = parse_title("<i>Declension of</i> hus (neuter)");
        assert!(c.table_tags.contains(&"neuter".to_string()));
    }
}

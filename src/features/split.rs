//! Form splitting and mixed-content regrouping
//!
//! A data cell often holds more than one form: comma-separated
//! alternatives, a form with its romanization on the next line, a form
//! followed by an IPA pronunciation, or parenthesized suffix alternatives
//! like "lampai(tten/den)". This module splits a cleaned cell text into
//! individual (form, romanization, ipa) lines and extracts the semantic
//! information that parentheses and brackets around a form carry.

use lazy_static::lazy_static;
use regex::Regex;

use crate::data::policies::LangPolicy;
use crate::data::tags::TagVocab;
use crate::utils::text::{distw, is_superscript, split_outside_parens};

// Private use area characters mask protected phrases during splitting
const MAGIC_FIRST: u32 = 0xE000;

lazy_static! {
    static ref IPA_RE: Regex = Regex::new(r"^\s*/.*/\s*$").unwrap();
    static ref LEADING_STARS_RE: Regex = Regex::new(r"^\*\*?([^ ])").unwrap();
    static ref PRONOUNCED_RE: Regex =
        Regex::new(r"^(pronounced with |\(with )").unwrap();
    static ref IN_THE_SENSE_RE: Regex =
        Regex::new(r"^\(in the sense [^)]*\)\s+").unwrap();
    static ref PAREN_ALT_RE: Regex =
        Regex::new(r"^\w+( \w+)* \(\w+( \w+)*(, \w+( \w+)*)*\)$").unwrap();
    static ref PAREN_TAIL_RE: Regex = Regex::new(r" \(.*$").unwrap();
    static ref INNER_ALT_RE: Regex =
        Regex::new(r"(^|\w|\*)\((\w+(/\w+)*)\)").unwrap();
    static ref CLITIC_RE: Regex =
        Regex::new(r"^[’'][a-z]([a-z][a-z]?)?$").unwrap();
    static ref WITH_OR_FORM_RE: Regex = Regex::new(r"^with |-form$").unwrap();
    static ref WITH_OR_FORM_LOOSE_RE: Regex =
        Regex::new(r"^with |-form").unwrap();
    static ref LEADING_PAREN_RE: Regex =
        Regex::new(r"(\s+|^)\(([^)]*)\)").unwrap();
    static ref TRAILING_PAREN_RE: Regex =
        Regex::new(r"\(([^)]*)\)(\s+|$)").unwrap();
}

/// Rough classification of a short text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Every word is a known tag
    Tags,
    /// Latin-script text, a romanization or an English gloss
    Romanization,
    /// Native-script text, most likely a form
    Other,
}

fn is_latin_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic()
        || matches!(ch, '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}')
}

/// Classify a fragment as tags, romanization, or native text.
pub fn classify_text(vocab: &TagVocab, text: &str) -> TextKind {
    let text = text.trim();
    if text.is_empty() {
        return TextKind::Other;
    }
    let mut words = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, ',' | ';')))
        .filter(|w| !w.is_empty());
    let mut any = false;
    let all_tags = (&mut words).all(|w| {
        any = true;
        vocab.contains(w)
    });
    if any && all_tags {
        return TextKind::Tags;
    }
    if text
        .chars()
        .filter(|c| c.is_alphabetic())
        .all(is_latin_letter)
    {
        TextKind::Romanization
    } else {
        TextKind::Other
    }
}

/// Alternatives split out of one cell, plus tags the split itself implied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitOutcome {
    pub alternatives: Vec<String>,
    pub extra_tags: Vec<String>,
}

/// Split a cell text into alternative forms.
///
/// Superscript-initial cells are footnote-like and never split. Otherwise
/// the text splits on `;`, `•`, newline and " or ", and additionally on
/// `,` and `/` unless the text is a " + " construction or ends with a
/// slash. Language-specific phrase splits and protected phrases are
/// honored.
pub fn split_into_alternatives(policy: &LangPolicy, text: &str) -> SplitOutcome {
    let mut extra_tags: Vec<String> = Vec::new();
    let mut alts: Vec<String>;
    if text.chars().next().map(is_superscript).unwrap_or(false) {
        alts = vec![text.to_string()];
    } else if let Some((phrase_alts, phrase_tags)) =
        policy.special_phrase_splits.get(text)
    {
        alts = phrase_alts.iter().map(|s| s.to_string()).collect();
        extra_tags.extend(phrase_tags.iter().map(|s| s.to_string()));
    } else {
        let mut separators: Vec<&str> = vec![";", "•", "\n", " or "];
        if !text.contains(" + ") {
            separators.push(",");
            if !text.ends_with('/') {
                separators.push("/");
            }
        }
        // Mask protected phrases so the separators inside them survive
        let mut masked = text.to_string();
        let mut repls: Vec<(String, String)> = Vec::new();
        let mut magic = MAGIC_FIRST;
        for phrase in &policy.protected_phrases {
            if masked.contains(phrase) {
                let ch = char::from_u32(magic).unwrap_or('\u{FFFD}').to_string();
                magic += 1;
                masked = masked.replace(phrase, &ch);
                repls.push((ch, phrase.to_string()));
            }
        }
        alts = split_outside_parens(&masked, &separators)
            .into_iter()
            .map(|mut alt| {
                for (ch, phrase) in &repls {
                    alt = alt.replace(ch.as_str(), phrase);
                }
                alt
            })
            .collect();
    }

    // A leading asterisk marks an unattested form; strip it so it does not
    // confuse romanization detection
    alts = alts
        .into_iter()
        .map(|x| LEADING_STARS_RE.replace(&x, "$1").into_owned())
        .filter(|x| !PRONOUNCED_RE.is_match(x))
        .map(|x| IN_THE_SENSE_RE.replace(&x, "").into_owned())
        .collect();

    // "base (alt, alt)" cells where the alternatives are close variants of
    // the base expand into separate forms
    let expandable = !alts.is_empty()
        && alts.iter().all(|alt| {
            PAREN_ALT_RE.is_match(alt) && {
                let base = PAREN_TAIL_RE.replace(alt, "").into_owned();
                paren_inner(alt)
                    .split(", ")
                    .all(|x| distw(&base, x) < 0.5)
            }
        });
    if expandable {
        let mut new_alts = Vec::new();
        for alt in &alts {
            let flat = alt.replace(" (", ", ").replace(')', "");
            for part in flat.split(", ") {
                new_alts.push(part.to_string());
            }
        }
        alts = new_alts;
    }

    SplitOutcome {
        alternatives: alts,
        extra_tags,
    }
}

fn paren_inner(text: &str) -> &str {
    match (text.rfind('('), text.rfind(')')) {
        (Some(open), Some(close)) if open < close => &text[open + 1..close],
        _ => "",
    }
}

/// One alternative, with an optional romanization and IPA pronunciation.
pub type FormLine = (String, String, String);

fn strip_markers(text: &str) -> String {
    let no_sup: String = text.chars().filter(|c| !is_superscript(*c)).collect();
    match no_sup.find('^') {
        Some(idx) => no_sup[..idx].to_string(),
        None => no_sup,
    }
}

fn kind_of(vocab: &TagVocab, text: &str) -> TextKind {
    classify_text(vocab, &strip_markers(text))
}

/// Regroup alternatives where romanizations or IPA pronunciations appear
/// as separate lines under or between the forms.
pub fn regroup_mixed_lines(vocab: &TagVocab, alts: Vec<String>) -> Vec<FormLine> {
    let n = alts.len();
    let half = n / 2;
    if n == 0 {
        return Vec::new();
    }
    // Forms first, matching IPA lines under them
    if n % 2 == 0 && alts[half..].iter().all(|x| IPA_RE.is_match(x)) {
        return (0..half)
            .map(|i| (alts[i].clone(), String::new(), alts[i + half].clone()))
            .collect();
    }
    // Several forms sharing a single trailing IPA
    if n > 2
        && IPA_RE.is_match(&alts[n - 1])
        && alts[..n - 1].iter().all(|x| !x.starts_with('/'))
    {
        return (0..n - 1)
            .map(|i| (alts[i].clone(), String::new(), alts[n - 1].clone()))
            .collect();
    }
    // One form with several IPA alternatives
    if n > 2
        && !alts[0].starts_with('/')
        && alts[1..].iter().all(|x| IPA_RE.is_match(x))
    {
        return (1..n)
            .map(|i| (alts[0].clone(), String::new(), alts[i].clone()))
            .collect();
    }
    let no_parens = alts.iter().all(|x| !x.contains('('));
    // Forms first, romanizations under them
    if n % 2 == 0
        && no_parens
        && alts[..half].iter().all(|x| kind_of(vocab, x) == TextKind::Other)
        && alts[half..]
            .iter()
            .all(|x| kind_of(vocab, x) == TextKind::Romanization)
    {
        return (0..half)
            .map(|i| (alts[i].clone(), alts[i + half].clone(), String::new()))
            .collect();
    }
    // Forms and romanizations alternating
    if n % 2 == 0
        && no_parens
        && alts
            .iter()
            .step_by(2)
            .all(|x| kind_of(vocab, x) == TextKind::Other)
        && alts
            .iter()
            .skip(1)
            .step_by(2)
            .all(|x| kind_of(vocab, x) == TextKind::Romanization)
    {
        return (0..n)
            .step_by(2)
            .map(|i| (alts[i].clone(), alts[i + 1].clone(), String::new()))
            .collect();
    }
    // Expand inner parenthesized suffix alternatives, "lampai(tten/den)"
    let mut out = Vec::new();
    for alt in &alts {
        let mut lst = vec![String::new()];
        let mut idx = 0;
        for caps in INNER_ALT_RE.captures_iter(alt) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let inner = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            if classify_text(vocab, inner) == TextKind::Tags
                || whole.as_str() == alt
            {
                continue;
            }
            let prefix_char = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let parts: Vec<&str> = inner.split('/').collect();
            let mut new_lst = Vec::new();
            for x in &lst {
                let stem =
                    format!("{}{}{}", x, &alt[idx..whole.start()], prefix_char);
                if parts.len() == 1 {
                    new_lst.push(stem.clone());
                    new_lst.push(format!("{}{}", stem, inner));
                } else {
                    for part in &parts {
                        new_lst.push(format!("{}{}", stem, part));
                    }
                }
            }
            idx = whole.end();
            lst = new_lst;
        }
        for x in lst {
            out.push((format!("{}{}", x, &alt[idx..]), String::new(), String::new()));
        }
    }
    out
}

/// Strip brackets that enclose a whole form, returning the tags they imply
/// for languages where brackets carry register information.
pub fn strip_semantic_brackets(policy: &LangPolicy, form: &str) -> (String, Vec<String>) {
    lazy_static! {
        static ref PAREN_FORM_RE: Regex =
            Regex::new(r"^\([^\]\[(){}]*\)$").unwrap();
        static ref CURLY_SQUARE_RE: Regex =
            Regex::new(r"^\{\[[^\]\[(){}]*\]\}$").unwrap();
        static ref CURLY_RE: Regex = Regex::new(r"^\{[^\]\[(){}]*\}$").unwrap();
        static ref SQUARE_RE: Regex =
            Regex::new(r"^\[[^\]\[(){}]*\]$").unwrap();
    }
    let mut tags = Vec::new();
    let stripped = if PAREN_FORM_RE.is_match(form) {
        if policy.parentheses_for_informal {
            tags.push("informal".to_string());
        }
        form[1..form.len() - 1].to_string()
    } else if CURLY_SQUARE_RE.is_match(form) {
        if policy.square_brackets_for_rare && policy.curly_brackets_for_archaic {
            tags.push("rare".to_string());
            tags.push("archaic".to_string());
        }
        form[2..form.len() - 2].to_string()
    } else if CURLY_RE.is_match(form) {
        if policy.curly_brackets_for_archaic {
            tags.push("archaic".to_string());
        }
        form[1..form.len() - 1].to_string()
    } else if SQUARE_RE.is_match(form) {
        if policy.square_brackets_for_rare {
            tags.push("rare".to_string());
        }
        form[1..form.len() - 1].to_string()
    } else {
        form.to_string()
    };
    (stripped, tags)
}

/// Result of interpreting a parenthesized part of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parenthetical {
    pub form: String,
    pub roman: String,
    pub clitic: Option<String>,
    pub extra_tags: Vec<String>,
}

/// Interpret a parenthesized part of a form as a clitic, a set of tags,
/// a romanization, or removable commentary.
pub fn extract_parenthetical(vocab: &TagVocab, form: &str, roman: &str) -> Parenthetical {
    let mut out = Parenthetical {
        form: form.to_string(),
        roman: roman.to_string(),
        clitic: None,
        extra_tags: Vec::new(),
    };
    let (paren, subst, start, end) =
        if let Some(caps) = LEADING_PAREN_RE.captures(form) {
            let whole = caps.get(0).unwrap();
            (
                caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string(),
                caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string(),
                whole.start(),
                whole.end(),
            )
        } else if let Some(caps) = TRAILING_PAREN_RE.captures(form) {
            let whole = caps.get(0).unwrap();
            (
                caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string(),
                caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string(),
                whole.start(),
                whole.end(),
            )
        } else {
            return out;
        };

    let splice =
        |f: &str| format!("{}{}{}", &f[..start], subst, &f[end..]).trim().to_string();

    if CLITIC_RE.is_match(&paren) {
        out.clitic = Some(paren);
        out.form = splice(form);
    } else if classify_text(vocab, &paren) == TextKind::Tags {
        out.extra_tags
            .extend(paren.split_whitespace().map(str::to_string));
        out.form = splice(form);
    } else if start > 0
        && roman.is_empty()
        && classify_text(vocab, &form[..start]) == TextKind::Other
        && classify_text(vocab, &paren) == TextKind::Romanization
        && !WITH_OR_FORM_RE.is_match(&paren)
    {
        out.roman = paren;
        out.form = splice(form);
    } else if WITH_OR_FORM_LOOSE_RE.is_match(&paren) {
        out.form = splice(form);
    }
    out
}

//! Cell text cleanup
//!
//! Strips footnote reference markers, recognizes footnote definitions, and
//! filters out prose cells before a cell is interpreted as a header or a
//! form. Returns the cleaned text together with the extracted reference
//! symbols, definitions, and any tags implied by the markers.

use lazy_static::lazy_static;
use regex::Regex;

use crate::data::policies::LangPolicy;
use crate::data::tags::markers;
use crate::utils::text::{is_superscript, normalize_whitespace};

lazy_static! {
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r"(?s)\s*,\s*$").unwrap();
    static ref TRAILING_BULLET_RE: Regex = Regex::new(r"(?s)\s*•\s*$").unwrap();

    // Cell starts that mark prose notes rather than forms or headers
    static ref PROSE_RE: Regex = Regex::new(
        r"^\s*(There are |\* |see |Use |use the |Only used |The forms in |these are also written |possible mutated form |\^*Note:|Note:)"
    ).unwrap();

    static ref FINAL_PAREN_RE: Regex = Regex::new(r"\s+\([^)]*\)$").unwrap();
    static ref CARET_REF_RE: Regex = Regex::new(r"\^(.|\([^)]*\))$").unwrap();

    /// Starts that introduce a footnote definition
    pub static ref DEF_RE: Regex = Regex::new(
        r"(?:\s*•?\s+)?(?:(\*+|[△†0123456789⁰¹²³⁴⁵⁶⁷⁸⁹⁺⁻]+)(?:[⁾):]|\s)|\^(\*+|[△†])|([¹²³⁴⁵⁶⁷⁸⁹])|([ᴬᴮᴰᴱᴳᴴᴵᴶᴷᴸᴹᴺᴼᴾᴿᵀᵁⱽᵂᵃᵇᶜᵈᵉᶠᵍʰⁱʲᵏˡᵐⁿᵒᵖʳˢᵗᵘᵛʷˣʸᶻᵝᵞᵟᶿᶥᵠᵡ]))"
    ).unwrap();

    /// Starts that look like definitions but are not ("1 sg", "15 / 17")
    pub static ref NONDEF_RE: Regex = Regex::new(
        r"^\s*(1|2|3)\s+(sg|pl)\s*$|^\s*\d\d?\s*/\s*\d\d?\s*$"
    ).unwrap();

    static ref TRAILING_STARS_RE: Regex = Regex::new(r"\*+$").unwrap();
}

/// Result of cleaning one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellContent {
    /// Cleaned text; the ignored-text marker for prose cells
    pub cleaned: String,
    /// Footnote reference symbols found at the end of the text
    pub refs: Vec<String>,
    /// Footnote definitions: (symbol, definition text)
    pub defs: Vec<(String, String)>,
    /// Tags implied by reference markers (rare, special references)
    pub tags: Vec<String>,
}

/// True when the text begins a footnote definition.
pub fn is_definition_start(text: &str) -> bool {
    match DEF_RE.find(text) {
        Some(m) => m.start() == 0 && !NONDEF_RE.is_match(text),
        None => false,
    }
}

/// Clean a cell text for interpretation.
pub fn extract_cell_content(policy: &LangPolicy, text: &str) -> CellContent {
    let mut tags: Vec<String> = Vec::new();
    let mut refs: Vec<String> = Vec::new();

    let mut col = text.to_string();
    for (pattern, replacement) in &policy.minor_text_cleanups {
        if let Ok(re) = Regex::new(pattern) {
            col = re.replace_all(&col, *replacement).into_owned();
        }
    }
    col = TRAILING_COMMA_RE.replace(&col, "").into_owned();
    col = TRAILING_BULLET_RE.replace(&col, "").into_owned();
    col = normalize_whitespace(&col);
    if PROSE_RE.is_match(&col) {
        return CellContent {
            cleaned: markers::IGNORED_TEXT_CELL.to_string(),
            ..CellContent::default()
        };
    }

    // Set aside a final parenthesized part so reference markers before it
    // can be extracted
    let mut final_paren = String::new();
    if let Some(m) = FINAL_PAREN_RE.find(&col) {
        final_paren = col[m.start()..].to_string();
        col.truncate(m.start());
    }

    // Peel ^x and ^(xyz) reference markers from the end
    loop {
        let (start, mut symbol) = match CARET_REF_RE.captures(&col) {
            Some(caps) => (
                caps.get(0).map(|m| m.start()).unwrap_or(0),
                caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string(),
            ),
            None => break,
        };
        if symbol.starts_with('(') && symbol.ends_with(')') {
            symbol = symbol[1..symbol.len() - 1].to_string();
        }
        if symbol == "rare" {
            tags.push("rare".to_string());
        } else if let Some(ref_tags) = policy.special_references.get(symbol.as_str()) {
            tags.extend(ref_tags.split_whitespace().map(str::to_string));
        } else {
            refs.push(symbol);
        }
        col.truncate(start);
    }

    // A cell that starts with a reference symbol defines a footnote
    if is_definition_start(&col) {
        let mut defs: Vec<(String, String)> = Vec::new();
        let mut prev_ref: Option<String> = None;
        let mut offset = 0;
        for caps in DEF_RE.captures_iter(&col) {
            let m = caps.get(0).unwrap();
            if let Some(symbol) = prev_ref.take() {
                defs.push((symbol, col[offset..m.start()].trim().to_string()));
            }
            let symbol = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            prev_ref = Some(symbol);
            offset = m.end();
        }
        if let Some(symbol) = prev_ref {
            defs.push((symbol, col[offset..].trim().to_string()));
        }
        return CellContent {
            cleaned: String::new(),
            refs: Vec::new(),
            defs,
            tags: Vec::new(),
        };
    }

    // Peel plain superscript markers from the end
    loop {
        let last = match col.chars().last() {
            Some(c) => c,
            None => break,
        };
        if !is_superscript(last) && last != '†' {
            break;
        }
        if col.ends_with("ʳᵃʳᵉ") {
            tags.push("rare".to_string());
            col.truncate(col.len() - "ʳᵃʳᵉ".len());
            col = col.trim_end().to_string();
            continue;
        }
        let mut matched = false;
        for (symbol, ref_tags) in &policy.special_references {
            if col.ends_with(symbol) {
                tags.extend(ref_tags.split_whitespace().map(str::to_string));
                col.truncate(col.len() - symbol.len());
                col = col.trim_end().to_string();
                matched = true;
                break;
            }
        }
        if matched {
            continue;
        }
        refs.push(last.to_string());
        col.truncate(col.len() - last.len_utf8());
    }

    // "1) text" style definitions
    let chars: Vec<char> = col.chars().collect();
    if chars.len() > 2
        && matches!(chars[1], ')' | ' ' | ':')
        && chars[0].is_ascii_digit()
        && !NONDEF_RE.is_match(&col)
    {
        let body: String = chars[2..].iter().collect();
        return CellContent {
            cleaned: String::new(),
            refs: Vec::new(),
            defs: vec![(chars[0].to_string(), body.trim().to_string())],
            tags: Vec::new(),
        };
    }
    col = col.trim().to_string();

    // Trailing asterisk reference symbols
    if let Some(m) = TRAILING_STARS_RE.find(&col) {
        refs.push(m.as_str().to_string());
        col.truncate(m.start());
    }
    if col.ends_with("(*)") {
        col.truncate(col.len() - 3);
        col = col.trim_end().to_string();
        refs.push("*".to_string());
    }

    let cleaned = format!("{}{}", col.trim(), final_paren);
    CellContent {
        cleaned: cleaned.trim().to_string(),
        refs,
        defs: Vec::new(),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LangPolicy {
        LangPolicy::default()
    }

    #[test]
    fn test_plain_text_unchanged() {
        let c = extract_cell_content(&policy(), "kissa");
        assert_eq!(c.cleaned, "kissa");
        assert!(c.refs.is_empty());
        assert!(c.defs.is_empty());
    }

    #[test]
    fn test_prose_cell_ignored() {
        let c = extract_cell_content(&policy(), "Note: these forms are dialectal");
        assert_eq!(c.cleaned, markers::IGNORED_TEXT_CELL);
    }

    #[test]
    fn test_superscript_ref_peeled() {
        let c = extract_cell_content(&policy(), "kissa¹");
        assert_eq!(c.cleaned, "kissa");
        assert_eq!(c.refs, vec!["¹".to_string()]);
    }

    #[test]
    fn test_caret_ref() {
        let c = extract_cell_content(&policy(), "talo^1");
        assert_eq!(c.cleaned, "talo");
        assert_eq!(c.refs, vec!["1".to_string()]);
    }

    #[test]
    fn test_caret_rare_becomes_tag() {
        let c = extract_cell_content(&policy(), "talo^(rare)");
        assert_eq!(c.cleaned, "talo");
        assert!(c.refs.is_empty());
        assert_eq!(c.tags, vec!["rare".to_string()]);
    }

    #[test]
    fn test_special_reference() {
        let mut p = policy();
        p.special_references.insert("ᵛᵒˢ", "second-person singular");
        let c = extract_cell_content(&p, "hablásᵛᵒˢ");
        assert_eq!(c.cleaned, "hablás");
        assert_eq!(
            c.tags,
            vec!["second-person".to_string(), "singular".to_string()]
        );
    }

    #[test]
    fn test_footnote_definition() {
        let c = extract_cell_content(&policy(), "¹ chiefly in the plural");
        assert_eq!(c.cleaned, "");
        assert_eq!(
            c.defs,
            vec![("¹".to_string(), "chiefly in the plural".to_string())]
        );
    }

    #[test]
    fn test_numbered_definition() {
        let c = extract_cell_content(&policy(), "1) only with prepositions");
        assert_eq!(
            c.defs,
            vec![("1".to_string(), "only with prepositions".to_string())]
        );
    }

    #[test]
    fn test_person_number_shorthand_is_not_definition() {
        assert!(!is_definition_start("1 sg"));
        assert!(!is_definition_start("15 / 17"));
        let c = extract_cell_content(&policy(), "1 sg");
        assert!(c.defs.is_empty());
    }

    #[test]
    fn test_trailing_star_and_paren_star() {
        let c = extract_cell_content(&policy(), "domov**");
        assert_eq!(c.cleaned, "domov");
        assert_eq!(c.refs, vec!["**".to_string()]);
        let c = extract_cell_content(&policy(), "domov(*)");
        assert_eq!(c.cleaned, "domov");
        assert_eq!(c.refs, vec!["*".to_string()]);
    }

    #[test]
    fn test_final_paren_preserved() {
        let c = extract_cell_content(&policy(), "kissan¹ (poss.)");
        assert_eq!(c.cleaned, "kissan (poss.)");
        assert_eq!(c.refs, vec!["¹".to_string()]);
    }

    #[test]
    fn test_trailing_comma_stripped() {
        let c = extract_cell_content(&policy(), "kissat,  ");
        assert_eq!(c.cleaned, "kissat");
    }
}

//! Small text helpers shared across the engine

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Returns true for superscript characters and modifier letters, which
/// tables use as footnote reference markers (¹, ᵃ, ᴺ, …).
pub fn is_superscript(ch: char) -> bool {
    matches!(ch,
        '\u{00B2}' | '\u{00B3}' | '\u{00B9}'
        | '\u{2070}'..='\u{207F}'
        | '\u{02B0}'..='\u{02C1}'
        | '\u{02E0}'..='\u{02E4}'
        | '\u{1D2C}'..='\u{1D7F}'
        | '\u{1D9B}'..='\u{1DBF}'
        | '\u{A770}'
    )
}

/// Levenshtein edit distance between two strings, by character.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// How distinct `word` is from `other`: 0.0 for identical strings, 1.0 for
/// completely different ones.
pub fn distw(other: &str, word: &str) -> f64 {
    let denom = other.chars().count().max(word.chars().count());
    if denom == 0 {
        return 0.0;
    }
    levenshtein(word, other) as f64 / denom as f64
}

/// Split text at separators, but not inside parentheses or brackets.
/// Separators are literal strings, tried longest first at each position.
pub fn split_outside_parens(text: &str, separators: &[&str]) -> Vec<String> {
    let mut seps: Vec<&str> = separators.to_vec();
    seps.sort_by_key(|s| std::cmp::Reverse(s.len()));
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut depth: i32 = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    'outer: while i < text.len() {
        let rest = &text[i..];
        let ch = rest.chars().next().unwrap();
        if matches!(ch, '(' | '[') {
            depth += 1;
        } else if matches!(ch, ')' | ']') {
            depth -= 1;
        } else if depth <= 0 {
            for sep in &seps {
                if rest.starts_with(sep) {
                    // A separator that is the entire text is content
                    if i == 0 && sep.len() == bytes.len() {
                        return vec![text.to_string()];
                    }
                    let trimmed = cur.trim();
                    if !trimmed.is_empty() {
                        parts.push(trimmed.to_string());
                    }
                    cur.clear();
                    i += sep.len();
                    continue 'outer;
                }
            }
        }
        cur.push(ch);
        i += ch.len_utf8();
    }
    let trimmed = cur.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \t b\n\nc "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_is_superscript() {
        assert!(is_superscript('¹'));
        assert!(is_superscript('ᵃ'));
        assert!(is_superscript('ᴺ'));
        assert!(!is_superscript('a'));
        assert!(!is_superscript('1'));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn test_distw() {
        assert_eq!(distw("cat", "cat"), 0.0);
        assert!(distw("cat", "dog") > 0.9);
        assert!(distw("unchanged", "unchange") < 0.2);
    }

    #[test]
    fn test_split_outside_parens() {
        assert_eq!(
            split_outside_parens("a, b; c", &[",", ";"]),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            split_outside_parens("a (b, c), d", &[","]),
            vec!["a (b, c)", "d"]
        );
    }

    #[test]
    fn test_split_whole_text_separator() {
        // A lone separator is content, not a split point
        assert_eq!(split_outside_parens(",", &[","]), vec![","]);
    }

    #[test]
    fn test_split_multichar_separator() {
        assert_eq!(
            split_outside_parens("go or goes", &[" or "]),
            vec!["go", "goes"]
        );
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Cyrillic letters plus U+0301 so stressed forms like "ма́ма" stay one token.
    static ref RE: Regex = Regex::new(r"[[\p{Cyrillic}&&\p{L}]\x{0301}]+").expect("valid regex");
}

/// One Cyrillic word found in a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// The word exactly as it appears in the source.
    pub text: String,
    /// Cache key form, see [`normalize_word`].
    pub normalized: String,
    /// Offset of the first character, counted in chars from the start of the scanned text.
    pub start: u32,
    /// Byte range of the match inside the scanned text.
    pub byte_range: Range<usize>,
}

/// A piece of a scanned text: either verbatim text or a matched word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Word(TokenMatch),
}

/// Lowercase, trimmed, NFC-composed form used as the cache key.
pub fn normalize_word(word: &str) -> String {
    word.trim().nfc().collect::<String>().to_lowercase()
}

/// Scan `text` for maximal runs of Cyrillic letters, left to right, in one pass.
pub fn tokenize(text: &str) -> Vec<TokenMatch> {
    let mut tokens = Vec::new();
    let mut byte_cursor = 0usize;
    let mut char_cursor = 0usize;
    for mat in RE.find_iter(text) {
        char_cursor += text[byte_cursor..mat.start()].chars().count();
        byte_cursor = mat.start();
        tokens.push(TokenMatch {
            text: mat.as_str().to_string(),
            normalized: normalize_word(mat.as_str()),
            start: char_cursor as u32,
            byte_range: mat.range(),
        });
    }
    tokens
}

/// Split `text` into literal runs and words; concatenating the segments gives back `text`.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0usize;
    for token in tokenize(text) {
        if token.byte_range.start > last {
            out.push(Segment::Literal(&text[last..token.byte_range.start]));
        }
        last = token.byte_range.end;
        out.push(Segment::Word(token));
    }
    if last < text.len() {
        out.push(Segment::Literal(&text[last..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(text: &str) -> String {
        segments(text)
            .into_iter()
            .map(|s| match s {
                Segment::Literal(l) => l.to_string(),
                Segment::Word(t) => t.text,
            })
            .collect()
    }

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Я читаю книгу.");
        let found: Vec<(&str, u32)> = t.iter().map(|m| (m.text.as_str(), m.start)).collect();
        assert_eq!(found, vec![("Я", 0), ("читаю", 2), ("книгу", 8)]);
        assert_eq!(t[0].normalized, "я");
    }

    #[test]
    fn stops_at_latin_and_digits() {
        let t = tokenize("словоABC2дом");
        let words: Vec<&str> = t.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(words, vec!["слово", "дом"]);
        assert_eq!(t[1].start, 9);
    }

    #[test]
    fn keeps_stress_mark_inside_word() {
        let t = tokenize("ма\u{301}ма пришла");
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].text, "ма\u{301}ма");
        assert_eq!(t[1].start, 6);
    }

    #[test]
    fn empty_and_latin_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("plain latin text, 123").is_empty());
        assert!(segments("").is_empty());
    }

    #[test]
    fn segments_rebuild_input() {
        for text in ["", "abc", "Ёлка, ёж и «Юла»!", "  пробел  ", "mixed смесь text ещё"] {
            assert_eq!(rebuild(text), text);
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        for w in ["  Книгу ", "ЁЖ", "ма\u{301}ма", "й"] {
            let once = normalize_word(w);
            assert_eq!(normalize_word(&once), once);
        }
        assert_eq!(normalize_word(" Книгу "), "книгу");
    }
}

use chitalka::tokenizer::{normalize_word, segments, tokenize, Segment};

#[test]
fn it_finds_words_with_char_offsets() {
    let toks = tokenize("Я читаю книгу.");
    let found: Vec<(String, u32)> = toks.into_iter().map(|t| (t.normalized, t.start)).collect();
    assert_eq!(found, vec![("я".to_string(), 0), ("читаю".to_string(), 2), ("книгу".to_string(), 8)]);
}

#[test]
fn it_skips_non_cyrillic_runs() {
    let toks = tokenize("The café «Ёлки-палки» 2024, Пётр!");
    let words: Vec<String> = toks.into_iter().map(|t| t.text).collect();
    assert_eq!(words, vec!["Ёлки", "палки", "Пётр"]);
}

#[test]
fn byte_ranges_slice_the_source() {
    let text = "ok: Мир, труд, май";
    for t in tokenize(text) {
        assert_eq!(&text[t.byte_range.clone()], t.text);
    }
}

#[test]
fn segments_cover_the_input_in_order() {
    let text = "«Война и мир» — роман Толстого (1869).";
    let mut rebuilt = String::new();
    let mut words = 0;
    for seg in segments(text) {
        match seg {
            Segment::Literal(l) => rebuilt.push_str(l),
            Segment::Word(t) => {
                words += 1;
                rebuilt.push_str(&t.text);
            }
        }
    }
    assert_eq!(rebuilt, text);
    assert_eq!(words, 5);
}

#[test]
fn normalization_is_stable() {
    for w in ["Москва", " МОСКВА ", "москва"] {
        assert_eq!(normalize_word(w), "москва");
        assert_eq!(normalize_word(&normalize_word(w)), normalize_word(w));
    }
}

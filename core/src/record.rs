use serde::{Deserialize, Serialize};

/// Stored in place of a definition when the dictionary page has no section for the language.
pub const NO_ENTRY: &str = "";

/// Default store language; one sled tree per language keeps the key extensible to `(word, lang)`.
pub const DEFAULT_LANG: &str = "ru";

/// The persisted unit: one normalized word, where it was seen, and its cached definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    /// Char offsets within the text runs the word was seen in; sorted, deduplicated.
    #[serde(default)]
    pub offsets: Vec<u32>,
    /// `None` = not fetched yet, `Some("")` = fetched and the dictionary had no entry.
    #[serde(default)]
    pub definition: Option<String>,
}

/// Borrowed view of a record's definition column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionState<'a> {
    Unfetched,
    NoEntry,
    Html(&'a str),
}

impl WordRecord {
    pub fn new(word: impl Into<String>) -> Self {
        Self { word: word.into(), offsets: Vec::new(), definition: None }
    }

    pub fn definition_state(&self) -> DefinitionState<'_> {
        match self.definition.as_deref() {
            None => DefinitionState::Unfetched,
            Some(NO_ENTRY) => DefinitionState::NoEntry,
            Some(html) => DefinitionState::Html(html),
        }
    }

    pub fn is_fetched(&self) -> bool {
        self.definition.is_some()
    }
}

/// The value half of a record, as stored under its word key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub offsets: Vec<u32>,
    pub definition: Option<String>,
}

impl StoredEntry {
    /// Union `offsets` into the entry and take `definition` only if it is `Some`.
    pub fn merge(&mut self, offsets: &[u32], definition: Option<&str>) {
        merge_offsets(&mut self.offsets, offsets);
        if let Some(d) = definition {
            self.definition = Some(d.to_string());
        }
    }

    pub fn into_record(self, word: String) -> WordRecord {
        WordRecord { word, offsets: self.offsets, definition: self.definition }
    }
}

impl From<&WordRecord> for StoredEntry {
    fn from(r: &WordRecord) -> Self {
        let mut offsets = Vec::with_capacity(r.offsets.len());
        merge_offsets(&mut offsets, &r.offsets);
        Self { offsets, definition: r.definition.clone() }
    }
}

/// Sorted set union, in place.
pub fn merge_offsets(into: &mut Vec<u32>, extra: &[u32]) {
    into.extend_from_slice(extra);
    into.sort_unstable();
    into.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_unions_and_keeps_definition() {
        let mut e = StoredEntry { offsets: vec![5, 1], definition: Some("<p>x</p>".into()) };
        e.merge(&[1, 9, 5], None);
        assert_eq!(e.offsets, vec![1, 5, 9]);
        assert_eq!(e.definition.as_deref(), Some("<p>x</p>"));
        e.merge(&[], Some(NO_ENTRY));
        assert_eq!(e.definition.as_deref(), Some(NO_ENTRY));
    }

    #[test]
    fn definition_states() {
        let mut r = WordRecord::new("дом");
        assert_eq!(r.definition_state(), DefinitionState::Unfetched);
        r.definition = Some(String::new());
        assert_eq!(r.definition_state(), DefinitionState::NoEntry);
        r.definition = Some("<ol></ol>".into());
        assert_eq!(r.definition_state(), DefinitionState::Html("<ol></ol>"));
    }
}

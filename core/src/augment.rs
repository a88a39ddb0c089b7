//! Grow the word list from cached definitions: forms a definition points at ("genitive singular
//! of поколе́ние") become records of their own, unfetched and with no occurrences.

use crate::cache::DefinitionCache;
use crate::error::Result;
use crate::record::DefinitionState;
use crate::tokenizer::tokenize;
use scraper::Html;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Stress mark; dictionary page titles never carry it.
const COMBINING_ACUTE: char = '\u{0301}';

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Augmented {
    pub scanned: usize,
    pub with_definition: usize,
    /// Words that were not in the cache before, sorted.
    pub added: Vec<String>,
}

/// Scan every cached definition for Cyrillic words and add the missing ones.
/// Single letters and the defined word itself are skipped.
pub fn augment(cache: &DefinitionCache) -> Result<Augmented> {
    let records = cache.get_all()?;
    let mut report = Augmented { scanned: records.len(), ..Augmented::default() };
    let mut added = BTreeSet::new();

    for record in &records {
        let DefinitionState::Html(html) = record.definition_state() else {
            continue;
        };
        report.with_definition += 1;

        for candidate in referenced_words(html) {
            if candidate.chars().count() < 2 || candidate == record.word || added.contains(&candidate) {
                continue;
            }
            if cache.get(&candidate)?.is_some() {
                continue;
            }
            cache.put(&candidate, &[], None)?;
            debug!(word = %candidate, from = %record.word, "added referenced word");
            added.insert(candidate);
        }
    }

    report.added = added.into_iter().collect();
    info!(
        scanned = report.scanned,
        with_definition = report.with_definition,
        added = report.added.len(),
        "augmented word store"
    );
    Ok(report)
}

/// Normalized, unstressed Cyrillic words in the visible text of a definition fragment.
fn referenced_words(html: &str) -> Vec<String> {
    let doc = Html::parse_fragment(html);
    let mut words = Vec::new();
    for text in doc.root_element().text() {
        for token in tokenize(text) {
            words.push(token.normalized.chars().filter(|c| *c != COMBINING_ACUTE).collect());
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NO_ENTRY;
    use crate::store::MemoryStore;

    fn cache() -> DefinitionCache {
        DefinitionCache::with_store(Box::new(MemoryStore::new()), None)
    }

    #[test]
    fn adds_forms_named_in_definitions() {
        let cache = cache();
        cache
            .put(
                "поколения",
                &[3],
                Some(r#"<ol><li>genitive singular of <a href="/wiki/x" title="поколение">поколе́ние</a></li></ol>"#),
            )
            .unwrap();
        cache.put("дом", &[1], Some("<p><b>дом</b> • (dom)</p><ol><li>house, home; see also до́мик</li></ol>")).unwrap();
        cache.put("да", &[], Some(NO_ENTRY)).unwrap();
        cache.put("и", &[], None).unwrap();

        let report = augment(&cache).unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.with_definition, 2);
        assert_eq!(report.added, vec!["домик", "поколение"]);

        let added = cache.get("поколение").unwrap().unwrap();
        assert!(added.offsets.is_empty());
        assert!(!added.is_fetched());
        assert_eq!(cache.get("дом").unwrap().unwrap().offsets, vec![1]);
    }

    #[test]
    fn second_run_adds_nothing() {
        let cache = cache();
        cache.put("книги", &[], Some("<ol><li>plural of кни́га; в книге</li></ol>")).unwrap();
        assert_eq!(augment(&cache).unwrap().added, vec!["книга", "книге"]);
        assert!(augment(&cache).unwrap().added.is_empty());
    }

    #[test]
    fn skips_single_letters_and_markup() {
        let words = referenced_words(r#"<p data-x="скрыто">в <span>лес</span></p>"#);
        assert_eq!(words, vec!["в", "лес"]);
        let cache = cache();
        cache.put("лесу", &[], Some(r#"<p data-x="скрыто">в <span>лес</span></p>"#)).unwrap();
        assert_eq!(augment(&cache).unwrap().added, vec!["лес"]);
    }
}

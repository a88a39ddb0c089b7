use crate::cache::DefinitionCache;
use crate::collapse::collapse_section;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::extract::extract_section;
use crate::record::{DefinitionState, NO_ENTRY};
use crate::source::PageSource;
use crate::throttle::Throttle;
use crate::tokenizer::normalize_word;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the dictionary has for a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// Collapsed section markup, ready to show.
    Html(String),
    /// The page exists but has no section for the language. Cached like a hit.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub word: String,
    pub definition: Definition,
    /// False for cache hits; only network lookups are throttled.
    pub from_network: bool,
}

/// Cache-first definition lookup:
/// check cache → on a miss retrieve the page → extract the language section → collapse → store.
/// Retrieval failures are returned and never cached; a missing section is cached as `NotFound`.
pub struct DefinitionFetcher<S> {
    cache: Arc<DefinitionCache>,
    source: S,
    throttle: Throttle,
    section: String,
}

impl<S: PageSource> DefinitionFetcher<S> {
    pub fn new(cache: Arc<DefinitionCache>, source: S, config: &FetchConfig) -> Self {
        Self {
            cache,
            source,
            throttle: Throttle::new(config.request_delay()),
            section: config.section.clone(),
        }
    }

    pub fn cache(&self) -> &DefinitionCache {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_definition(&self, word: &str, offsets: &[u32]) -> Result<Fetched, FetchError> {
        let word = normalize_word(word);
        if word.is_empty() {
            return Err(FetchError::EmptyWord);
        }

        if let Some(record) = self.cache.get(&word)? {
            let cached = match record.definition_state() {
                DefinitionState::Html(html) => Some(Definition::Html(html.to_string())),
                DefinitionState::NoEntry => Some(Definition::NotFound),
                DefinitionState::Unfetched => None,
            };
            if let Some(definition) = cached {
                if !offsets.is_empty() {
                    self.cache.put(&word, offsets, None)?;
                }
                debug!(word = %word, "definition cache hit");
                return Ok(Fetched { word, definition, from_network: false });
            }
        }

        self.throttle.wait().await;
        let page = match self.source.fetch_page(&word).await {
            Ok(page) => page,
            Err(e) => {
                warn!(word = %word, error = %e, "dictionary retrieval failed");
                return Err(e.into());
            }
        };

        let definition = match transform_page(&page, &self.section) {
            Some(html) => {
                self.cache.put(&word, offsets, Some(&html))?;
                info!(word = %word, bytes = html.len(), "stored definition");
                Definition::Html(html)
            }
            None => {
                self.cache.put(&word, offsets, Some(NO_ENTRY))?;
                info!(word = %word, section = %self.section, "no section for word");
                Definition::NotFound
            }
        };
        Ok(Fetched { word, definition, from_network: true })
    }
}

/// Extract `section` from a raw page and collapse it. `None` when the page has no such section.
pub fn transform_page(page: &str, section: &str) -> Option<String> {
    let doc = Html::parse_document(page);
    let found = extract_section(&doc, section)?;
    let body = collapse_section(&found);
    if body.trim().is_empty() {
        return None;
    }
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_keeps_only_collapsed_target() {
        let page = r#"<html><body>
<h2 id="English">English</h2><h3>Noun</h3><p>english</p>
<h2 id="Russian">Russian</h2>
<h3 id="Russian_Etymology">Etymology</h3><p>From Proto-Slavic.</p>
<h3 id="Russian_Noun">Noun</h3><p><b>книга</b></p><ol><li>book</li></ol>
<h2 id="French">French</h2><p>french</p>
</body></html>"#;
        let html = transform_page(page, "Russian").unwrap();
        assert_eq!(html.matches("<details").count(), 2);
        assert!(html.contains("<ol><li>book</li></ol>"));
        assert!(!html.contains("english"));
        assert!(!html.contains("french"));
    }

    #[test]
    fn transform_without_section_is_none() {
        assert!(transform_page("<html><body><h2 id=\"French\">French</h2><p>x</p></body></html>", "Russian").is_none());
    }
}

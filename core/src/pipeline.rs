//! Top-level driver: wrap every Cyrillic word of a document in a clickable marker, collect the
//! unique words, and optionally look each one up.

use crate::fetcher::DefinitionFetcher;
use crate::html::{
    escape_attr, escape_text, fragment_nodes, has_class, is_raw_text, is_tag, write_end_tag, write_node,
    write_node_skipping, write_start_tag, HtmlNode,
};
use crate::source::PageSource;
use crate::tokenizer::{segments, Segment};
use scraper::{Html, Node};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Class of the produced word marker.
pub const MARKER_CLASS: &str = "russian-word";
/// `data-lang` value telling the UI the token can be looked up.
pub const MARKER_LANG: &str = "ru";

/// Elements whose text is never wrapped.
const NO_WRAP: &[&str] = &["head", "title", "style", "textarea", "noscript", "template", "svg", "math"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordOccurrences {
    pub word: String,
    /// Char offsets, each relative to the text run the word was found in.
    pub offsets: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct Rewritten {
    pub html: String,
    /// Unique normalized words in first-seen, depth-first document order.
    pub words: Vec<WordOccurrences>,
}

impl Rewritten {
    pub fn unique_words(&self) -> Vec<String> {
        self.words.iter().map(|w| w.word.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordFailure {
    pub word: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Processed {
    pub html: String,
    pub words: Vec<String>,
    /// Words whose lookup failed; the rest of the batch still ran.
    pub failures: Vec<WordFailure>,
    /// How many lookups went to the network.
    pub fetched: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Wrap,
    /// Inside an existing marker: count the words, leave the markup alone.
    CollectOnly,
}

#[derive(Default)]
struct Collector {
    words: Vec<WordOccurrences>,
    index: HashMap<String, usize>,
}

impl Collector {
    fn record(&mut self, word: &str, offset: u32) {
        match self.index.get(word) {
            Some(&i) => self.words[i].offsets.push(offset),
            None => {
                self.index.insert(word.to_string(), self.words.len());
                self.words.push(WordOccurrences { word: word.to_string(), offsets: vec![offset] });
            }
        }
    }
}

/// Rewrite `html` with every word wrapped. `<script>` elements are dropped. A full document
/// (starting with a doctype or `<html>`) comes back whole; anything else is treated as a fragment.
pub fn rewrite(html: &str) -> Rewritten {
    let mut out = String::with_capacity(html.len() * 2);
    let mut collector = Collector::default();

    if is_full_document(html) {
        let doc = Html::parse_document(html);
        walk(doc.tree.root(), Mode::Wrap, &mut out, &mut collector);
    } else {
        let doc = Html::parse_fragment(html);
        for child in fragment_nodes(&doc) {
            walk(child, Mode::Wrap, &mut out, &mut collector);
        }
    }
    Rewritten { html: out, words: collector.words }
}

fn is_full_document(html: &str) -> bool {
    let start: String = html.trim_start().chars().take(9).collect::<String>().to_ascii_lowercase();
    start.starts_with("<!doctype") || start.starts_with("<html")
}

fn walk(node: HtmlNode<'_>, mode: Mode, out: &mut String, collector: &mut Collector) {
    match node.value() {
        Node::Element(el) if el.name() == "script" => {}
        Node::Element(el) if NO_WRAP.contains(&el.name()) || is_raw_text(el.name()) => {
            write_node_skipping(node, out, &|n| is_tag(n, "script"));
        }
        Node::Element(el) => {
            let child_mode = if el.name() == "span" && has_class(el, MARKER_CLASS) { Mode::CollectOnly } else { mode };
            write_start_tag(el, out);
            for child in node.children() {
                walk(child, child_mode, out, collector);
            }
            write_end_tag(el, out);
        }
        Node::Text(t) => {
            for seg in segments(t) {
                match seg {
                    Segment::Literal(lit) => escape_text(lit, out),
                    Segment::Word(tok) => {
                        collector.record(&tok.normalized, tok.start);
                        if mode == Mode::Wrap {
                            write_marker(&tok.text, &tok.normalized, out);
                        } else {
                            escape_text(&tok.text, out);
                        }
                    }
                }
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                walk(child, mode, out, collector);
            }
        }
        _ => write_node(node, out),
    }
}

fn write_marker(text: &str, normalized: &str, out: &mut String) {
    out.push_str("<span class=\"");
    out.push_str(MARKER_CLASS);
    out.push_str("\" data-lang=\"");
    out.push_str(MARKER_LANG);
    out.push_str("\" data-word=\"");
    escape_attr(normalized, out);
    out.push_str("\">");
    escape_text(text, out);
    out.push_str("</span>");
}

/// Rewrites documents and, on request, warms the cache with every word they contain.
pub struct ContentPipeline<S> {
    fetcher: DefinitionFetcher<S>,
}

impl<S: PageSource> ContentPipeline<S> {
    pub fn new(fetcher: DefinitionFetcher<S>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &DefinitionFetcher<S> {
        &self.fetcher
    }

    /// Rewrite `html`; when `fetch_definitions` is set, look up each unique word one at a time.
    /// Network lookups are spaced by the fetcher's throttle, cache hits are not.
    pub async fn process(&self, html: &str, fetch_definitions: bool) -> Processed {
        let rewritten = rewrite(html);
        let words = rewritten.unique_words();
        let mut failures = Vec::new();
        let mut fetched = 0usize;

        if fetch_definitions {
            for occ in &rewritten.words {
                match self.fetcher.fetch_definition(&occ.word, &occ.offsets).await {
                    Ok(f) if f.from_network => fetched += 1,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(word = %occ.word, error = %e, "definition lookup failed, continuing");
                        failures.push(WordFailure { word: occ.word.clone(), error: e.to_string() });
                    }
                }
            }
            info!(words = words.len(), fetched, failed = failures.len(), "processed document");
        }

        Processed { html: rewritten.html, words, failures, fetched }
    }
}

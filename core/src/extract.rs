//! Cut one language section out of a dictionary page.
//!
//! A section has no closing marker: it is the run of siblings after its heading, ending at the
//! next top-level heading or at the end of the parent.

use crate::html::{element, has_class, is_heading_tag, is_insignificant, is_tag, render, HtmlNode};
use scraper::node::Element;
use scraper::{Html, Node};

/// The nodes belonging to one language on a dictionary page. Borrows the parsed page.
pub struct DictionarySection<'a> {
    heading: HtmlNode<'a>,
    nodes: Vec<HtmlNode<'a>>,
}

impl<'a> DictionarySection<'a> {
    /// The element that carried the section id (or the matching `h2`).
    pub fn heading(&self) -> HtmlNode<'a> {
        self.heading
    }

    pub fn title(&self) -> String {
        heading_text(self.heading).trim().to_string()
    }

    /// Section body in document order, heading excluded.
    pub fn nodes(&self) -> &[HtmlNode<'a>] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| is_insignificant(*n))
    }

    pub fn to_html(&self) -> String {
        render(self.nodes.iter().copied())
    }
}

/// Find the section whose heading id equals `section` (case-sensitive, first match wins).
/// Falls back to the first `h2` whose visible text equals `section`. `None` means the page has
/// no entry for that language.
pub fn extract_section<'a>(doc: &'a Html, section: &str) -> Option<DictionarySection<'a>> {
    let by_id = doc
        .tree
        .root()
        .descendants()
        .find(|n| element(*n).and_then(Element::id) == Some(section));

    let (heading, anchor) = match by_id {
        Some(target) => (target, heading_anchor(target)),
        None => {
            let h2 = doc
                .tree
                .root()
                .descendants()
                .find(|n| is_tag(*n, "h2") && heading_text(*n).trim() == section)?;
            (h2, wrapper_of(h2).unwrap_or(h2))
        }
    };

    let mut nodes = Vec::new();
    let mut cur = anchor.next_sibling();
    while let Some(n) = cur {
        if is_top_heading(n) {
            break;
        }
        nodes.push(n);
        cur = n.next_sibling();
    }

    let found = DictionarySection { heading, nodes };
    if found.is_empty() {
        tracing::debug!(section, "section heading found but body is empty");
        return None;
    }
    Some(found)
}

/// Parse `page` and return the section's markup, or `None` when the language is missing.
pub fn extract_section_html(page: &str, section: &str) -> Option<String> {
    let doc = Html::parse_document(page);
    extract_section(&doc, section).map(|s| s.to_html())
}

/// The node whose following siblings form the section body.
fn heading_anchor(target: HtmlNode<'_>) -> HtmlNode<'_> {
    if let Some(wrapper) = wrapper_of(target) {
        return wrapper;
    }
    if element(target).map_or(false, |el| is_heading_tag(el.name())) {
        return target;
    }
    match target.parent() {
        Some(p) if p.value().is_element() && !is_tag(p, "body") => p,
        _ => target,
    }
}

/// `<div class="mw-heading mw-heading2">` style wrapper around a heading.
fn wrapper_of(node: HtmlNode<'_>) -> Option<HtmlNode<'_>> {
    node.parent()
        .filter(|p| element(*p).map_or(false, |el| el.classes().any(|c| c.starts_with("mw-heading"))))
}

/// Language-level heading: `h1`/`h2`, or a MediaWiki level-2 wrapper.
pub(crate) fn is_top_heading(node: HtmlNode<'_>) -> bool {
    match element(node) {
        Some(el) => matches!(el.name(), "h1" | "h2") || has_class(el, "mw-heading1") || has_class(el, "mw-heading2"),
        None => false,
    }
}

/// Visible heading text, leaving out `[edit]` links.
pub(crate) fn heading_text(node: HtmlNode<'_>) -> String {
    let mut s = String::new();
    collect_heading_text(node, &mut s);
    s
}

fn collect_heading_text(node: HtmlNode<'_>, out: &mut String) {
    match node.value() {
        Node::Text(t) => out.push_str(t),
        Node::Element(el) if has_class(el, "mw-editsection") => {}
        Node::Element(_) => {
            for c in node.children() {
                collect_heading_text(c, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN: &str = r#"<!DOCTYPE html><html><head><title>x</title></head><body>
<div class="mw-parser-output">
<div class="mw-heading mw-heading2"><h2 id="English">English</h2><span class="mw-editsection">[edit]</span></div>
<p>English stuff</p>
<div class="mw-heading mw-heading2"><h2 id="Russian">Russian</h2><span class="mw-editsection">[edit]</span></div>
<div class="mw-heading mw-heading3"><h3 id="Noun">Noun</h3></div>
<p>книга</p>
<ol><li>book</li></ol>
<div class="mw-heading mw-heading2"><h2 id="Ukrainian">Ukrainian</h2></div>
<p>Ukrainian stuff</p>
</div></body></html>"#;

    const FLAT: &str = r#"<html><body>
<h1>Test Word</h1>
<h2 id="English">English</h2><h3>Etymology</h3><p>This is the English etymology.</p>
<h2 id="Russian">Russian</h2><h3 id="Russian_Etymology">Etymology</h3><p>This is the Russian etymology.</p>
<h3 id="Russian_Noun">Noun</h3><p>This is the Russian noun definition.</p>
<h2 id="French">French</h2><h3>Etymology</h3><p>This is the French etymology.</p>
</body></html>"#;

    #[test]
    fn takes_exactly_the_target_section() {
        let doc = Html::parse_document(MODERN);
        let s = extract_section(&doc, "Russian").unwrap();
        let html = s.to_html();
        assert!(html.contains("книга"));
        assert!(html.contains("<ol><li>book</li></ol>"));
        assert!(!html.contains("English stuff"));
        assert!(!html.contains("Ukrainian"));
        assert_eq!(s.title(), "Russian");
    }

    #[test]
    fn heading_element_directly_under_body() {
        let doc = Html::parse_document(FLAT);
        let s = extract_section(&doc, "Russian").unwrap();
        let html = s.to_html();
        assert!(html.contains("Russian etymology"));
        assert!(html.contains("Russian noun definition"));
        assert!(!html.contains("French"));
        assert!(!html.contains("English etymology"));
    }

    #[test]
    fn missing_language_is_none() {
        let doc = Html::parse_document(FLAT);
        assert!(extract_section(&doc, "Japanese").is_none());
        assert!(extract_section(&doc, "russian").is_none());
    }

    #[test]
    fn falls_back_to_heading_text() {
        let page = r#"<body><h2><span class="mw-headline">Russian</span><span class="mw-editsection">[edit]</span></h2><p>тест</p><h2>Serbo-Croatian</h2><p>x</p></body>"#;
        let html = extract_section_html(page, "Russian").unwrap();
        assert_eq!(html, "<p>тест</p>");
    }

    #[test]
    fn span_id_inside_old_style_heading() {
        let page = r#"<body><h2><span class="mw-headline" id="Russian">Russian</span></h2><p>да</p><h2><span id="Serbian">Serbian</span></h2></body>"#;
        assert_eq!(extract_section_html(page, "Russian").unwrap(), "<p>да</p>");
    }

    #[test]
    fn empty_section_counts_as_missing() {
        let page = r#"<body><h2 id="Russian">Russian</h2>  <h2 id="French">French</h2><p>x</p></body>"#;
        assert!(extract_section_html(page, "Russian").is_none());
    }
}

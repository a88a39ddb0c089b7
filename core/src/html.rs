//! Small helpers over scraper's tree: node classification and serialization.
//!
//! Transforms in this crate never mutate the parsed tree. They walk it by parent/sibling links and
//! write new markup. Untouched subtrees go through scraper's serializer; the writers here cover the
//! nodes a transform leaves out or rewrites.

use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};

pub type HtmlNode<'a> = NodeRef<'a, Node>;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Parsing runs with scripting enabled, so `noscript` content is one raw text node as well.
const RAW_TEXT_ELEMENTS: &[&str] =
    &["script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript"];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

pub fn element(node: HtmlNode<'_>) -> Option<&Element> {
    node.value().as_element()
}

pub fn is_tag(node: HtmlNode<'_>, name: &str) -> bool {
    element(node).map_or(false, |el| el.name() == name)
}

pub fn has_class(el: &Element, class: &str) -> bool {
    el.classes().any(|c| c == class)
}

pub fn is_heading_tag(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Whitespace-only text and comments carry nothing a reader would see.
pub fn is_insignificant(node: HtmlNode<'_>) -> bool {
    match node.value() {
        Node::Text(t) => t.trim().is_empty(),
        Node::Comment(_) => true,
        _ => false,
    }
}

/// First element among `node` and its following siblings.
pub fn first_element_from<'a>(node: Option<HtmlNode<'a>>) -> Option<HtmlNode<'a>> {
    let mut cur = node;
    while let Some(n) = cur {
        if n.value().is_element() {
            return Some(n);
        }
        cur = n.next_sibling();
    }
    None
}

/// Top-level nodes of a document parsed with [`Html::parse_fragment`].
pub fn fragment_nodes(doc: &Html) -> Vec<HtmlNode<'_>> {
    doc.root_element().children().collect()
}

pub fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

pub fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

pub fn write_start_tag(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(el.name());
    for (name, value) in el.attrs.iter() {
        out.push(' ');
        if let Some(prefix) = &name.prefix {
            out.push_str(prefix);
            out.push(':');
        }
        out.push_str(&name.local);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
}

pub fn write_end_tag(el: &Element, out: &mut String) {
    if !is_void(el.name()) {
        out.push_str("</");
        out.push_str(el.name());
        out.push('>');
    }
}

/// Serialize `node` and its subtree.
pub fn write_node(node: HtmlNode<'_>, out: &mut String) {
    write_node_skipping(node, out, &|_| false);
}

/// Serialize `node`, leaving out every subtree for which `skip` is true.
pub fn write_node_skipping<F>(node: HtmlNode<'_>, out: &mut String, skip: &F)
where
    F: Fn(HtmlNode<'_>) -> bool,
{
    if skip(node) {
        return;
    }
    if let Some(el) = ElementRef::wrap(node) {
        // scraper serializes with scripting off and would escape noscript content
        if !node.descendants().any(|n| skip(n) || is_tag(n, "noscript")) {
            out.push_str(&el.html());
            return;
        }
    }
    match node.value() {
        Node::Text(t) => {
            let raw = node
                .parent()
                .and_then(element)
                .map_or(false, |p| is_raw_text(p.name()));
            if raw {
                out.push_str(t);
            } else {
                escape_text(t, out);
            }
        }
        Node::Element(el) => {
            write_start_tag(el, out);
            for child in node.children() {
                write_node_skipping(child, out, skip);
            }
            write_end_tag(el, out);
        }
        Node::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
        Node::Doctype(d) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(d.name());
            match (d.public_id(), d.system_id()) {
                ("", "") => {}
                ("", system) => {
                    out.push_str(" SYSTEM \"");
                    out.push_str(system);
                    out.push('"');
                }
                (public, system) => {
                    out.push_str(" PUBLIC \"");
                    out.push_str(public);
                    out.push('"');
                    if !system.is_empty() {
                        out.push_str(" \"");
                        out.push_str(system);
                        out.push('"');
                    }
                }
            }
            out.push('>');
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node_skipping(child, out, skip);
            }
        }
        _ => {}
    }
}

pub fn render<'a>(nodes: impl IntoIterator<Item = HtmlNode<'a>>) -> String {
    let mut out = String::new();
    for n in nodes {
        write_node(n, &mut out);
    }
    out
}

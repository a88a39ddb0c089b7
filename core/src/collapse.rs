//! Turn a section's flat run of sub-headings and content into `<details>` panels.
//!
//! Each sub-heading (a `mw-heading3` wrapper or a bare `h3`) starts a unit whose panel holds
//! every following sibling up to the next sub-heading. A unit opens by default when its panel
//! leads with a numbered sense list; the first unit is always open.

use crate::extract::{heading_text, DictionarySection};
use crate::html::{
    element, escape_attr, escape_text, first_element_from, fragment_nodes, has_class, is_tag, render,
    write_node_skipping, HtmlNode,
};
use scraper::Html;

/// Class carried by every produced `<details>`; its presence marks already-collapsed markup.
pub const SECTION_CLASS: &str = "wiktionary-section";
const TITLE_CLASS: &str = "wiktionary-section-title";
const CONTENT_CLASS: &str = "wiktionary-section-content";

/// One expandable header + panel pair.
pub struct CollapseUnit<'a> {
    pub heading: HtmlNode<'a>,
    pub panel: Vec<HtmlNode<'a>>,
    pub open: bool,
}

/// A section body split into leading content and units, in original order.
pub struct Collapsed<'a> {
    pub preamble: Vec<HtmlNode<'a>>,
    pub units: Vec<CollapseUnit<'a>>,
}

pub fn is_subheading(node: HtmlNode<'_>) -> bool {
    element(node).map_or(false, |el| el.name() == "h3" || has_class(el, "mw-heading3"))
}

/// True when `nodes` already contain collapsed units at the top level.
pub fn is_collapsed(nodes: &[HtmlNode<'_>]) -> bool {
    nodes
        .iter()
        .any(|n| element(*n).map_or(false, |el| el.name() == "details" && has_class(el, SECTION_CLASS)))
}

/// Group the body into units without rendering anything.
pub fn group<'a>(nodes: &[HtmlNode<'a>]) -> Collapsed<'a> {
    let mut preamble = Vec::new();
    let mut units: Vec<CollapseUnit<'a>> = Vec::new();
    for &node in nodes {
        if is_subheading(node) {
            units.push(CollapseUnit { heading: node, panel: Vec::new(), open: false });
        } else if let Some(unit) = units.last_mut() {
            unit.panel.push(node);
        } else {
            preamble.push(node);
        }
    }
    for unit in units.iter_mut() {
        unit.open = leads_with_sense_list(&unit.panel);
    }
    if let Some(first) = units.first_mut() {
        first.open = true;
    }
    Collapsed { preamble, units }
}

/// Open when the panel starts with an `<ol>`, or with a headword paragraph directly followed by one.
fn leads_with_sense_list(panel: &[HtmlNode<'_>]) -> bool {
    let Some(first) = first_element_from(panel.first().copied()) else {
        return false;
    };
    if is_tag(first, "ol") {
        return true;
    }
    if !is_tag(first, "p") {
        return false;
    }
    first_element_from(first.next_sibling()).map_or(false, |second| is_tag(second, "ol"))
}

impl Collapsed<'_> {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for n in &self.preamble {
            write_clean(*n, &mut out);
        }
        for unit in &self.units {
            out.push_str("<details class=\"");
            out.push_str(SECTION_CLASS);
            out.push('"');
            if unit.open {
                out.push_str(" open");
            }
            out.push_str("><summary class=\"");
            out.push_str(TITLE_CLASS);
            out.push_str("\">");
            write_summary(unit.heading, &mut out);
            out.push_str("</summary><div class=\"");
            out.push_str(CONTENT_CLASS);
            out.push_str("\">");
            for n in &unit.panel {
                write_clean(*n, &mut out);
            }
            out.push_str("</div></details>");
        }
        out
    }
}

/// Collapse a section body. Markup that is already collapsed comes back unchanged.
pub fn collapse(nodes: &[HtmlNode<'_>]) -> String {
    if is_collapsed(nodes) {
        return render(nodes.iter().copied());
    }
    group(nodes).to_html()
}

pub fn collapse_section(section: &DictionarySection<'_>) -> String {
    collapse(section.nodes())
}

/// Parse a fragment and collapse it.
pub fn collapse_html(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    let nodes = fragment_nodes(&doc);
    if is_collapsed(&nodes) {
        return fragment.to_string();
    }
    group(&nodes).to_html()
}

fn write_clean(node: HtmlNode<'_>, out: &mut String) {
    write_node_skipping(node, out, &|n| is_tag(n, "script"));
}

fn write_summary(heading: HtmlNode<'_>, out: &mut String) {
    if is_tag(heading, "h3") {
        write_heading_span(heading, out);
        return;
    }
    for child in heading.children() {
        if is_tag(child, "h3") {
            write_heading_span(child, out);
        } else {
            write_node_skipping(child, out, &|n| {
                is_tag(n, "script") || element(n).map_or(false, |el| has_class(el, "mw-editsection"))
            });
        }
    }
}

/// `<h3>` becomes a `<span>` with the same id and class and the heading's plain text.
fn write_heading_span(h3: HtmlNode<'_>, out: &mut String) {
    out.push_str("<span");
    if let Some(el) = element(h3) {
        if let Some(id) = el.id() {
            out.push_str(" id=\"");
            escape_attr(id, out);
            out.push('"');
        }
        if let Some(class) = el.attr("class") {
            out.push_str(" class=\"");
            escape_attr(class, out);
            out.push('"');
        }
    }
    out.push('>');
    escape_text(heading_text(h3).trim(), out);
    out.push_str("</span>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(fragment: &str) -> Vec<(String, bool)> {
        let doc = Html::parse_fragment(fragment);
        let nodes = fragment_nodes(&doc);
        group(&nodes)
            .units
            .iter()
            .map(|u| (heading_text(u.heading).trim().to_string(), u.open))
            .collect()
    }

    #[test]
    fn open_state_follows_content_shape() {
        let got = units(
            "<h3>Etymology</h3><p>From Old East Slavic.</p>\
             <h3>Noun</h3><ol><li>book</li></ol>\
             <h3>Pronunciation</h3><p>IPA</p>\
             <h3>Verb</h3><p><b>читать</b></p>\n<ol><li>to read</li></ol>\
             <h3>Declension</h3><table><tr><td>x</td></tr></table><ol><li>late</li></ol>",
        );
        assert_eq!(
            got,
            vec![
                ("Etymology".to_string(), true),
                ("Noun".to_string(), true),
                ("Pronunciation".to_string(), false),
                ("Verb".to_string(), true),
                ("Declension".to_string(), false),
            ]
        );
    }

    #[test]
    fn first_unit_open_even_without_list() {
        let got = units("<h3>Etymology</h3><p>prose</p><h3>Usage</h3><p>more</p>");
        assert_eq!(got, vec![("Etymology".to_string(), true), ("Usage".to_string(), false)]);
    }

    #[test]
    fn renders_details_and_keeps_order() {
        let html = collapse_html(
            "<p>lead</p><div class=\"mw-heading mw-heading3\"><h3 id=\"Noun\">Noun</h3>\
             <span class=\"mw-editsection\">[edit]</span></div><ol><li>book</li></ol><script>x()</script>\
             <h3 id=\"Related\">Related terms</h3><ul><li>книжка</li></ul>",
        );
        assert_eq!(
            html,
            "<p>lead</p>\
             <details class=\"wiktionary-section\" open><summary class=\"wiktionary-section-title\"><span id=\"Noun\">Noun</span></summary>\
             <div class=\"wiktionary-section-content\"><ol><li>book</li></ol></div></details>\
             <details class=\"wiktionary-section\"><summary class=\"wiktionary-section-title\"><span id=\"Related\">Related terms</span></summary>\
             <div class=\"wiktionary-section-content\"><ul><li>книжка</li></ul></div></details>"
        );
    }

    #[test]
    fn collapsing_twice_is_a_no_op() {
        let once = collapse_html("<h3>Noun</h3><ol><li>book</li></ol>");
        assert_eq!(collapse_html(&once), once);
        assert_eq!(once.matches("<details").count(), 1);
    }

    #[test]
    fn panel_noscript_survives_collapsing() {
        let html = collapse_html(r#"<h3>Noun</h3><ol><li>book</li></ol><noscript><img src="x.png" alt="a"></noscript>"#);
        assert!(html.contains(r#"<noscript><img src="x.png" alt="a"></noscript></div></details>"#), "{html}");
    }

    #[test]
    fn no_subheadings_passes_content_through() {
        assert_eq!(collapse_html("<p>just text</p>"), "<p>just text</p>");
    }
}

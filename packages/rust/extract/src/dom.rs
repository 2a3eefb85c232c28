//! Parsed-document abstraction over `scraper`.
//!
//! The extraction rules in this crate operate on [`ArticleDom`] only, so the
//! heuristics stay independent of the concrete HTML parser. The surface is
//! exactly what the rules need: find-by-id text, body/document text with a
//! configurable separator, anchor lookup by href, nearest block-level
//! ancestor, and whole-document serialization.

use scraper::{ElementRef, Html, Selector};

/// Block-level element names considered when looking for a caption ancestor.
const BLOCK_ANCESTORS: [&str; 3] = ["p", "li", "div"];

/// A parsed HTML document.
pub struct ArticleDom {
    doc: Html,
}

impl ArticleDom {
    /// Parse a full HTML document.
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// Concatenated text of the element with the given id, each text node
    /// trimmed and joined with `sep`. `None` if no such element exists.
    pub fn text_by_id(&self, id: &str, sep: &str) -> Option<String> {
        let sel = Selector::parse("[id]").unwrap();
        self.doc
            .select(&sel)
            .find(|el| el.value().attr("id") == Some(id))
            .map(|el| joined_text(el, sep))
    }

    /// Text of the `<body>` element, or `None` if the document has none.
    pub fn body_text(&self, sep: &str) -> Option<String> {
        let sel = Selector::parse("body").unwrap();
        self.doc.select(&sel).next().map(|el| joined_text(el, sep))
    }

    /// Text of the whole document tree.
    pub fn document_text(&self, sep: &str) -> String {
        let texts: Vec<&str> = self
            .doc
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        texts.join(sep)
    }

    /// Serialized HTML of the whole document.
    pub fn serialize(&self) -> String {
        self.doc.html()
    }

    /// Whether an anchor element with exactly this href exists.
    pub fn has_anchor(&self, href: &str) -> bool {
        self.anchor_by_href(href).is_some()
    }

    /// Own text of the first anchor whose href equals `href`.
    pub fn anchor_text(&self, href: &str) -> Option<String> {
        self.anchor_by_href(href).map(|el| joined_text(el, ""))
    }

    /// Text of the nearest block-level ancestor (`p`, `li`, or `div`) of the
    /// first anchor whose href equals `href`.
    pub fn block_ancestor_text(&self, href: &str) -> Option<String> {
        let anchor = self.anchor_by_href(href)?;
        anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| BLOCK_ANCESTORS.contains(&el.value().name()))
            .map(|el| joined_text(el, ""))
    }

    /// Exact-match anchor lookup. Iterates rather than building a selector
    /// from the href, so arbitrary link strings are safe.
    fn anchor_by_href(&self, href: &str) -> Option<ElementRef<'_>> {
        let sel = Selector::parse("a[href]").unwrap();
        self.doc
            .select(&sel)
            .find(|el| el.value().attr("href") == Some(href))
    }
}

/// Collect an element's text nodes, trimmed, empties dropped, joined with `sep`.
fn joined_text(el: ElementRef<'_>, sep: &str) -> String {
    let texts: Vec<&str> = el.text().map(str::trim).filter(|t| !t.is_empty()).collect();
    texts.join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html><head><title>Head Title</title></head><body>
        <div id="js_content">
            <p>First paragraph.</p>
            <p>Second <span>paragraph</span>.</p>
        </div>
        <p>来源文章：<a href="https://s.example.cc/AB12">An anchor</a></p>
    </body></html>"#;

    #[test]
    fn text_by_id_joins_with_separator() {
        let dom = ArticleDom::parse(SAMPLE);
        let text = dom.text_by_id("js_content", "\n").expect("container");
        assert!(text.contains("First paragraph."));
        assert!(text.contains('\n'));

        let flat = dom.text_by_id("js_content", "").expect("container");
        assert!(!flat.contains('\n'));
    }

    #[test]
    fn text_by_id_missing_returns_none() {
        let dom = ArticleDom::parse(SAMPLE);
        assert!(dom.text_by_id("nope", "").is_none());
    }

    #[test]
    fn body_and_document_text() {
        let dom = ArticleDom::parse(SAMPLE);
        let body = dom.body_text("").expect("body");
        assert!(body.contains("First paragraph."));
        // Whole-document text also covers <head>.
        assert!(dom.document_text("").contains("Head Title"));
        assert!(!body.contains("Head Title"));
    }

    #[test]
    fn anchor_lookup_and_block_ancestor() {
        let dom = ArticleDom::parse(SAMPLE);
        assert!(dom.has_anchor("https://s.example.cc/AB12"));
        assert!(!dom.has_anchor("https://s.example.cc/CD34"));

        assert_eq!(
            dom.anchor_text("https://s.example.cc/AB12").as_deref(),
            Some("An anchor")
        );
        let parent = dom
            .block_ancestor_text("https://s.example.cc/AB12")
            .expect("parent paragraph");
        assert!(parent.starts_with("来源文章"));
    }

    #[test]
    fn serialize_contains_raw_markup() {
        let dom = ArticleDom::parse(SAMPLE);
        assert!(dom.serialize().contains(r#"id="js_content""#));
    }
}

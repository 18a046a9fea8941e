//! SEO metadata extraction from fetched HTML
//!
//! Parsing never fails: `scraper` builds a tree out of any input, and every
//! missing or empty element simply yields an empty string.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Metadata pulled from a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    /// Text of the first `<h1>`
    pub h1: String,
    /// Text of the `<title>`
    pub title: String,
    /// `content` of `<meta name="description">`
    pub description: String,
}

/// Extract metadata from a raw response body.
///
/// The body is decoded as UTF-8; invalid sequences become U+FFFD rather than
/// aborting the extraction.
pub fn extract_metadata(body: &[u8]) -> PageMetadata {
    let html = String::from_utf8_lossy(body);
    extract_from_str(&html)
}

/// Extract metadata from an already decoded document
pub fn extract_from_str(html: &str) -> PageMetadata {
    let doc = Html::parse_document(html);

    PageMetadata {
        h1: first_text(&doc, "h1"),
        title: first_text(&doc, "title"),
        description: meta_description(&doc),
    }
}

fn first_text(doc: &Html, selector: &str) -> String {
    let Ok(sel) = Selector::parse(selector) else {
        return String::new();
    };

    doc.select(&sel)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// First `<meta>` whose `name` is `description`, compared case-insensitively
fn meta_description(doc: &Html) -> String {
    let Ok(sel) = Selector::parse("meta[name]") else {
        return String::new();
    };

    doc.select(&sel)
        .find(|m| {
            m.value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|m| m.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

//! HTML metadata extraction for snapshot records.
//!
//! Pulls the tag-level metadata a snapshot stores: document title, meta
//! description, meta keywords, and outgoing links. Outlinks keep document
//! order and duplicates; hrefs are stored as written (trimmed), not
//! resolved against the base url.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Tag-level metadata extracted from one HTML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub outlinks: Vec<String>,
}

/// Extract title, description, keywords, and outlinks from an HTML document.
pub fn page_meta(html: &str) -> PageMeta {
    let document = Html::parse_document(html);
    PageMeta {
        title: title(&document),
        description: description(&document),
        keywords: keywords(&document),
        outlinks: outlinks(&document),
    }
}

fn title(document: &Html) -> String {
    let selector = Selector::parse("title").expect("invalid selector");
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Description from the meta tag if one exists, otherwise empty.
fn description(document: &Html) -> String {
    let selector = Selector::parse("meta[name=description]").expect("invalid selector");
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or_default()
        .to_string()
}

/// Keywords from the meta tag content, split on `,` and trimmed.
fn keywords(document: &Html) -> Vec<String> {
    let selector = Selector::parse("meta[name=keywords]").expect("invalid selector");
    let mut keywords = Vec::new();
    for element in document.select(&selector) {
        if let Some(content) = element.value().attr("content") {
            for keyword in content.split(',') {
                keywords.push(keyword.trim().to_string());
            }
        }
    }
    keywords
}

/// All `a[href]` values in document order, trimmed, duplicates preserved.
fn outlinks(document: &Html) -> Vec<String> {
    let selector = Selector::parse("a[href]").expect("invalid selector");
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title> Example Domain </title>
            <meta name="description" content="An example page">
            <meta name="keywords" content="example, test , demo">
        </head>
        <body>
            <a href="https://example.com/a">First</a>
            <a href="/relative">Second</a>
            <a href="https://example.com/a">Repeat</a>
            <a href=" https://example.com/spaced ">Spaced</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_page_meta_full_document() {
        let meta = page_meta(PAGE);
        assert_eq!(meta.title, "Example Domain");
        assert_eq!(meta.description, "An example page");
        assert_eq!(meta.keywords, vec!["example", "test", "demo"]);
    }

    #[test]
    fn test_outlinks_document_order_with_duplicates() {
        let meta = page_meta(PAGE);
        assert_eq!(
            meta.outlinks,
            vec![
                "https://example.com/a",
                "/relative",
                "https://example.com/a",
                "https://example.com/spaced",
            ]
        );
    }

    #[test]
    fn test_missing_metadata_is_empty() {
        let meta = page_meta("<html><body><p>bare</p></body></html>");
        assert_eq!(meta.title, "");
        assert_eq!(meta.description, "");
        assert!(meta.keywords.is_empty());
        assert!(meta.outlinks.is_empty());
    }

    #[test]
    fn test_anchor_without_href_skipped() {
        let meta = page_meta(r#"<html><body><a name="anchor">No href</a><a href="/x">X</a></body></html>"#);
        assert_eq!(meta.outlinks, vec!["/x"]);
    }

    #[test]
    fn test_multiple_keyword_tags_concatenate() {
        let html = r#"
            <html><head>
                <meta name="keywords" content="one, two">
                <meta name="keywords" content="three">
            </head><body></body></html>
        "#;
        let meta = page_meta(html);
        assert_eq!(meta.keywords, vec!["one", "two", "three"]);
    }
}

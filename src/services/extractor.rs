// src/services/extractor.rs

//! Ad-disclosure link extraction.
//!
//! Every disclosure marker on a page claims the first usable anchor that
//! follows it in document order.

use std::sync::LazyLock;

use scraper::{Html, Node, Selector};
use url::Url;

use crate::models::ExtractedLink;
use crate::utils::url::{is_javascript, resolve, strip_fragment};

/// Text announcing that the next link is sponsored.
pub const DISCLOSURE_MARKER: &str = "※一部、広告・宣伝が含まれます。";

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("static selector is valid"));

/// What a page yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// No disclosure marker on the page
    NotApplicable,
    /// Marker present but no qualifying link after it
    PresentEmpty,
    /// Deduplicated candidate links, in document order
    Links(Vec<ExtractedLink>),
}

impl Extraction {
    /// Candidate URLs, empty unless links were found.
    pub fn candidates(&self) -> Vec<&str> {
        match self {
            Self::Links(links) => links.iter().map(|l| l.candidate.as_str()).collect(),
            Self::NotApplicable | Self::PresentEmpty => Vec::new(),
        }
    }
}

/// Parse `html` and extract ad links relative to `base_url`.
pub fn extract_ad_links(html: &str, base_url: &str) -> Extraction {
    let Ok(base) = Url::parse(base_url) else {
        log::warn!("Cannot extract links, invalid page URL: {base_url}");
        return Extraction::NotApplicable;
    };
    let document = Html::parse_document(html);
    extract_from_document(&document, &base)
}

/// Extract ad links from an already parsed document.
pub fn extract_from_document(document: &Html, base: &Url) -> Extraction {
    let Some(body) = document.select(&BODY).next() else {
        return Extraction::NotApplicable;
    };

    let page = strip_fragment(base.as_str());
    let mut marker_found = false;
    let mut awaiting_link = false;
    let mut links: Vec<ExtractedLink> = Vec::new();

    for node in body.descendants() {
        match node.value() {
            Node::Text(text) if text.contains(DISCLOSURE_MARKER) => {
                marker_found = true;
                awaiting_link = true;
            }
            Node::Element(element) if awaiting_link && element.name() == "a" => {
                let Some(href) = element.attr("href").map(str::trim) else {
                    continue;
                };
                if href.is_empty() || is_javascript(href) {
                    continue;
                }

                // The anchor is consumed even when it is dropped below.
                awaiting_link = false;
                let Some(resolved) = resolve(base, href) else {
                    continue;
                };
                let candidate = strip_fragment(resolved.as_str());
                if candidate != page && !links.iter().any(|l| l.candidate == candidate) {
                    links.push(ExtractedLink {
                        source_page: page.to_string(),
                        candidate: candidate.to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    match (marker_found, links.is_empty()) {
        (false, _) => Extraction::NotApplicable,
        (true, true) => Extraction::PresentEmpty,
        (true, false) => Extraction::Links(links),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://foo.hatenablog.com/entry/2024/01/01/000000";

    fn page(body: &str) -> String {
        format!("<html><body>{body}</body></html>")
    }

    fn candidates(extraction: &Extraction) -> Vec<&str> {
        extraction.candidates()
    }

    #[test]
    fn test_marker_followed_by_anchor() {
        let html = page(&format!(
            r#"<p>{DISCLOSURE_MARKER}</p><a href="https://shop.example/aff?id=1">buy</a>"#
        ));
        let extraction = extract_ad_links(&html, PAGE);
        assert_eq!(candidates(&extraction), vec!["https://shop.example/aff?id=1"]);
        if let Extraction::Links(links) = &extraction {
            assert_eq!(links[0].source_page, PAGE);
        }
    }

    #[test]
    fn test_no_marker_is_not_applicable() {
        let html = page(r#"<a href="https://shop.example/aff?id=1">buy</a>"#);
        assert_eq!(extract_ad_links(&html, PAGE), Extraction::NotApplicable);
    }

    #[test]
    fn test_marker_without_anchor_is_present_empty() {
        let html = page(&format!(r#"<p>{DISCLOSURE_MARKER}</p><p>no links</p>"#));
        assert_eq!(extract_ad_links(&html, PAGE), Extraction::PresentEmpty);
    }

    #[test]
    fn test_anchor_before_marker_is_ignored() {
        let html = page(&format!(
            r#"<a href="https://shop.example/before">x</a><p>{DISCLOSURE_MARKER}</p>"#
        ));
        assert_eq!(extract_ad_links(&html, PAGE), Extraction::PresentEmpty);
    }

    #[test]
    fn test_skips_javascript_and_empty_hrefs() {
        let html = page(&format!(
            r#"<p>{DISCLOSURE_MARKER}</p>
               <a href="javascript:void(0)">js</a>
               <a href="">empty</a>
               <a name="anchor">no href</a>
               <a href="/go/shop">shop</a>"#
        ));
        assert_eq!(
            candidates(&extract_ad_links(&html, PAGE)),
            vec!["https://foo.hatenablog.com/go/shop"]
        );
    }

    #[test]
    fn test_self_link_consumes_marker() {
        let html = page(&format!(
            r##"<p>{DISCLOSURE_MARKER}</p><a href="#comments">top</a>
                <a href="https://shop.example/later">later</a>"##
        ));
        assert_eq!(extract_ad_links(&html, PAGE), Extraction::PresentEmpty);
    }

    #[test]
    fn test_one_link_per_marker_with_dedup_and_fragments() {
        let html = page(&format!(
            r#"<div>{DISCLOSURE_MARKER}<a href="https://shop.example/a#x">A</a>
                 <a href="https://shop.example/ignored">ignored</a></div>
               <div>{DISCLOSURE_MARKER}<a href="https://shop.example/a">A again</a></div>
               <div>{DISCLOSURE_MARKER}<span><a href="https://shop.example/b">B</a></span></div>"#
        ));
        assert_eq!(
            candidates(&extract_ad_links(&html, PAGE)),
            vec!["https://shop.example/a", "https://shop.example/b"]
        );
    }

    #[test]
    fn test_nested_marker_finds_following_anchor_outside_parent() {
        let html = page(&format!(
            r#"<section><p><small>{DISCLOSURE_MARKER}</small></p></section>
               <article><h2>Title</h2><p><a href="https://shop.example/c">C</a></p></article>"#
        ));
        assert_eq!(
            candidates(&extract_ad_links(&html, PAGE)),
            vec!["https://shop.example/c"]
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let html = page(DISCLOSURE_MARKER);
        assert_eq!(extract_ad_links(&html, "not a url"), Extraction::NotApplicable);
    }
}

// src/services/platform.rs

//! Blog platform detection and per-platform page rules.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::utils::url::{is_javascript, resolve, strip_fragment};

const HATENA_HOSTS: [&str; 4] = ["hatenablog.com", "hatenablog.jp", "hateblo.jp", "hatenadiary"];
const LIVEDOOR_HOSTS: [&str; 3] = ["livedoor.blog", "livedoor.jp", "blog.jp"];

/// Anchor texts Livedoor themes use for the "next page" link.
const LIVEDOOR_NEXT_TEXTS: [&str; 2] = ["»", "次へ"];

static REL_NEXT: LazyLock<Selector> =
    LazyLock::new(|| parse(r#"a[rel~="next"][href], link[rel~="next"][href]"#));
static ANCHOR_REL_NEXT: LazyLock<Selector> = LazyLock::new(|| parse(r#"a[rel~="next"][href]"#));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| parse("a[href]"));
static LIVEDOOR_ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| parse(r#"article[class*="article"]"#));
static LIVEDOOR_TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    parse("h1.article-title a[href], h2.article-title a[href], a.article-title-link[href]")
});

fn parse(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

/// Supported blog platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Hatena Blog: paginated index pages carry the ad links directly
    Hatena,
    /// Livedoor Blog: paginated article lists, ad links live on articles
    Livedoor,
    /// Any other host: single pages following `rel=next`
    Generic,
}

impl Platform {
    /// Classify a blog URL by its host.
    ///
    /// Returns `None` when the URL has no host at all.
    pub fn detect(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();

        if HATENA_HOSTS.iter().any(|h| host.contains(h)) {
            Some(Self::Hatena)
        } else if LIVEDOOR_HOSTS.iter().any(|h| host.contains(h)) {
            Some(Self::Livedoor)
        } else {
            Some(Self::Generic)
        }
    }

    /// Whether pages of this platform list articles instead of carrying
    /// the ad links themselves.
    pub fn lists_articles(&self) -> bool {
        matches!(self, Self::Livedoor)
    }

    /// Find the absolute URL of the next page.
    pub fn next_page(&self, document: &Html, base: &Url) -> Option<String> {
        let href = match self {
            Self::Hatena => document
                .select(&ANCHOR_REL_NEXT)
                .next()
                .and_then(|a| a.value().attr("href")),
            Self::Livedoor => document
                .select(&ANCHOR)
                .find(is_livedoor_next)
                .and_then(|a| a.value().attr("href")),
            Self::Generic => document
                .select(&REL_NEXT)
                .next()
                .and_then(|a| a.value().attr("href")),
        }?;

        if href.trim().is_empty() || is_javascript(href) {
            return None;
        }
        resolve(base, href).map(|u| u.to_string())
    }

    /// Article URLs listed on a page, fragment-stripped and deduplicated.
    ///
    /// Only Livedoor list pages have articles; other platforms return none.
    pub fn article_links(&self, document: &Html, base: &Url) -> Vec<String> {
        if !self.lists_articles() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for article in document.select(&LIVEDOOR_ARTICLE) {
            let Some(href) = article
                .select(&LIVEDOOR_TITLE_LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() || href.starts_with('#') || is_javascript(href) {
                continue;
            }
            if let Some(url) = resolve(base, href) {
                let link = strip_fragment(url.as_str()).to_string();
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
        }
        links
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hatena => f.write_str("hatena"),
            Self::Livedoor => f.write_str("livedoor"),
            Self::Generic => f.write_str("generic"),
        }
    }
}

fn is_livedoor_next(anchor: &ElementRef<'_>) -> bool {
    let classes = anchor.value().classes().any(|c| c == "next" || c == "pager-next");
    classes || {
        let text: String = anchor.text().collect();
        LIVEDOOR_NEXT_TEXTS.iter().any(|t| text.contains(t))
    }
}

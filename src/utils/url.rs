// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative href against a base URL.
///
/// # Examples
/// ```
/// use link_checker::utils::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/path/").unwrap();
/// assert_eq!(
///     resolve(&base, "page.html").unwrap().as_str(),
///     "https://example.com/path/page.html"
/// );
/// ```
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Drop the `#fragment` part of a URL string.
pub fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(head, _)| head)
}

/// Lowercased host of a URL string.
///
/// # Examples
/// ```
/// use link_checker::utils::url::host_of;
///
/// assert_eq!(
///     host_of("https://Example.COM:8080/path"),
///     Some("example.com".to_string())
/// );
/// ```
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Whether an href points at a script instead of a page.
pub fn is_javascript(href: &str) -> bool {
    href.trim_start()
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

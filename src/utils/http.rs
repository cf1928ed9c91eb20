// src/utils/http.rs

//! HTTP client utilities.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.9,en;q=0.8";

/// How much of a body is scanned for a `<meta>` charset declaration.
const SNIFF_LIMIT: usize = 4096;

/// Matches both `<meta charset=..>` and the `http-equiv` content-type form.
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("static regex is valid")
});

/// Create the shared asynchronous HTTP client.
///
/// Sends a browser-like header set and follows transport redirects.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );

    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| AppError::config(format!("invalid user agent: {e}")))?;
    headers.insert(header::USER_AGENT, user_agent);

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Charset label declared by a `Content-Type` header.
pub fn charset_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| {
            ct.split(';')
                .filter_map(|part| part.trim().split_once('='))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
                .map(|(_, v)| v.trim().trim_matches('"').to_ascii_lowercase())
        })
}

/// Charset label declared by a `<meta>` tag near the top of `body`.
pub fn meta_charset(body: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_LIMIT)]);
    META_CHARSET
        .captures(&head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Decode a response body.
///
/// The header charset wins, then a `<meta>` declaration, then UTF-8.
/// Unknown labels are skipped. Returns the text and the encoding name used.
pub fn decode_body(declared: Option<&str>, body: &[u8]) -> (String, String) {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| meta_charset(body).and_then(|label| Encoding::for_label(label.as_bytes())))
        .unwrap_or(UTF_8);
    let (text, used, _) = encoding.decode(body);
    (text.into_owned(), used.name().to_ascii_lowercase())
}

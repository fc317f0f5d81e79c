//! Text clean-up shared by connectors and the corpus merge.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside", "form",
];

static BOILERPLATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BOILERPLATE_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("valid regex"))
        .collect()
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid regex"));

static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("valid regex"));

/// Replace NULs, collapse all whitespace runs to one space, trim.
#[must_use]
pub fn normalize_text(input: &str) -> String {
    input
        .replace('\0', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first `max_chars` Unicode scalar values of `input`.
#[must_use]
pub fn clip_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Extract readable text from an HTML page.
///
/// Works on `<body>` when present, drops boilerplate blocks (scripts, styles,
/// navigation, headers, footers, asides, forms) and comments, strips the
/// remaining tags, decodes common entities, and normalizes whitespace.
#[must_use]
pub fn extract_main_text(html: &str) -> String {
    let body = BODY_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or(html, |m| m.as_str());

    let mut cleaned = COMMENT_RE.replace_all(body, " ").into_owned();
    for re in BOILERPLATE_RES.iter() {
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }
    let no_tags = TAG_RE.replace_all(&cleaned, " ");
    normalize_text(&decode_entities(&no_tags))
}

/// Decode the handful of HTML entities that show up in page and caption text.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    input
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// SHA-256 of the case-folded, whitespace-normalized text, hex encoded.
#[must_use]
pub fn content_fingerprint(text: &str) -> String {
    let canonical = normalize_text(text).to_lowercase();
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

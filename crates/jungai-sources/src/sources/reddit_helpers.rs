//! Reddit post helpers: query building, brand matching, and post conversion.

use std::collections::HashSet;

use jungai_core::{BrandQuery, SourceKind};

use super::reddit::Post;
use crate::text::normalize_text;
use crate::types::SourceDocument;

/// Posts shorter than this rarely say anything about the brand.
const MIN_POST_CHARS: usize = 100;

pub(super) fn build_query_variants(brand: &BrandQuery) -> Vec<String> {
    let mut variants = Vec::new();
    for term in brand.terms() {
        variants.push(format!("\"{term}\""));
        variants.push(term.to_string());
    }
    variants.push(brand.slug().replace('-', " "));

    // Collapse duplicates while preserving order.
    let mut seen = HashSet::new();
    variants.retain(|q| !q.trim().is_empty() && seen.insert(q.to_lowercase()));
    variants
}

pub(super) fn build_brand_terms(brand: &BrandQuery) -> Vec<String> {
    let mut terms = Vec::new();
    for term in brand.terms() {
        terms.push(normalize_text_for_match(term));
        terms.push(normalize_text_for_match(&term.replace('\'', "")));
    }
    terms.push(normalize_text_for_match(&brand.slug().replace('-', " ")));
    terms.retain(|t| !t.is_empty());
    terms.sort();
    terms.dedup();
    terms
}

pub(super) fn mentions_brand(text: &str, brand_terms: &[String]) -> bool {
    let normalized = normalize_text_for_match(text);
    let padded = format!(" {normalized} ");
    let compact = normalized.replace(' ', "");
    brand_terms.iter().any(|term| {
        if term.len() < 3 {
            return false;
        }
        let needle = format!(" {term} ");
        if padded.contains(&needle) {
            return true;
        }
        let compact_term = term.replace(' ', "");
        compact_term.len() >= 6 && compact.contains(&compact_term)
    })
}

fn normalize_text_for_match(input: &str) -> String {
    input
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() {
                ch.to_lowercase().next().unwrap_or(ch)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn usable_body(body: Option<&str>) -> Option<&str> {
    body.map(str::trim)
        .filter(|b| !b.is_empty() && *b != "[deleted]" && *b != "[removed]")
}

/// Title plus self text, or `None` for link-less or too-short posts.
pub(super) fn to_document(post: &Post) -> Option<SourceDocument> {
    let permalink = post.data.permalink.as_deref().filter(|p| p.starts_with('/'))?;
    let title = usable_body(post.data.title.as_deref());
    let body = usable_body(post.data.selftext.as_deref());

    let text = match (title, body) {
        (Some(title), Some(body)) => format!("{title} {body}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => return None,
    };
    if normalize_text(&text).chars().count() < MIN_POST_CHARS {
        return None;
    }

    Some(SourceDocument::new(
        SourceKind::Discussion,
        format!("https://www.reddit.com{permalink}"),
        title.map(str::to_string),
        &text,
    ))
}

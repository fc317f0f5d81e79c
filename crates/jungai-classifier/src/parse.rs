//! Mapping model replies onto the archetype taxonomy.

use std::sync::LazyLock;

use jungai_core::Archetype;
use regex::Regex;
use serde_json::{Map, Value};

/// Canonical labels as whole words, case-insensitive.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = Archetype::ALL
        .iter()
        .map(|a| regex::escape(&a.label().to_lowercase()))
        .collect();
    Regex::new(&format!(r"(?i)\b({})\b", alternatives.join("|"))).expect("valid regex")
});

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("valid regex"));

static LINE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:archetype|label|answer)\s*[:\-]\s*").expect("valid regex")
});

/// A label and justification read from one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub archetype: Archetype,
    pub justification: String,
}

/// Read a reply to the initial request.
///
/// A JSON object must carry an `archetype` (or `label`) field naming a known
/// label or alias. Any other text must mention exactly one distinct
/// canonical label as a whole word.
///
/// # Errors
///
/// Returns a human-readable reason when the reply names no label, an
/// unknown label, or more than one label.
pub fn parse_reply(raw: &str) -> Result<ParsedReply, String> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err("empty reply".to_string());
    }

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        let label = first_text(&fields, &["archetype", "label"])
            .ok_or_else(|| "JSON reply has no archetype field".to_string())?;
        let archetype = Archetype::from_label(label)
            .ok_or_else(|| format!("unknown archetype label '{label}'"))?;
        let justification = first_text(&fields, &["justification", "reason"])
            .unwrap_or_default()
            .to_string();
        return Ok(ParsedReply {
            archetype,
            justification,
        });
    }

    let archetype = single_label_mention(body)?;
    Ok(ParsedReply {
        archetype,
        justification: collapse_whitespace(body),
    })
}

/// Read a reply to the strict retry: label on the first line, optional
/// justification on the second. Falls back to [`parse_reply`] when the
/// first line is not a bare label.
///
/// # Errors
///
/// Same as [`parse_reply`].
pub fn parse_strict_reply(raw: &str) -> Result<ParsedReply, String> {
    let body = strip_code_fence(raw.trim());
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());

    if let Some(first) = lines.next() {
        let candidate = LINE_PREFIX_RE.replace(first, "");
        if let Some(archetype) = Archetype::from_label(&candidate) {
            let justification = lines.next().unwrap_or_default().to_string();
            return Ok(ParsedReply {
                archetype,
                justification,
            });
        }
    }

    parse_reply(raw)
}

fn single_label_mention(text: &str) -> Result<Archetype, String> {
    let mut found: Vec<Archetype> = Vec::new();
    for m in LABEL_RE.find_iter(text) {
        if let Some(archetype) = Archetype::from_label(m.as_str()) {
            if !found.contains(&archetype) {
                found.push(archetype);
            }
        }
    }

    match found.as_slice() {
        [only] => Ok(*only),
        [] => Err("reply names no archetype label".to_string()),
        many => {
            let labels: Vec<&str> = many.iter().map(|a| a.label()).collect();
            Err(format!("reply names several labels: {}", labels.join(", ")))
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    CODE_FENCE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First of `keys` holding a non-blank string; null or blank values fall
/// through to the next key.
fn first_text<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

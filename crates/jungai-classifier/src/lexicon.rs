//! Archetype keyword lexicon used as evidence for a verdict.
//!
//! Matching is punctuation- and hyphen-insensitive over word uni-, bi-, and
//! trigrams, so "rule-breaking" matches "rule breaking" and "Rule Breaking!".
//! Evidence never changes a label.

use std::collections::{BTreeMap, HashSet};

use jungai_core::Archetype;

/// Unmatched keywords reported for the chosen label.
pub const MISSING_LIMIT: usize = 10;
const SUGGESTED_WORDS: usize = 5;

/// Keywords per archetype, lower-case.
#[must_use]
pub fn keywords(archetype: Archetype) -> &'static [&'static str] {
    match archetype {
        Archetype::Innocent => &[
            "pure", "simple", "honest", "wholesome", "natural", "optimism", "optimistic",
            "goodness", "innocent", "clean", "fresh", "happy", "nostalgia", "trust",
        ],
        Archetype::Everyman => &[
            "everyday", "ordinary", "down to earth", "relatable", "belong", "belonging",
            "affordable", "community", "neighbor", "real people", "for everyone", "friendly",
            "practical", "no frills",
        ],
        Archetype::Hero => &[
            "courage", "courageous", "champion", "win", "winning", "victory", "strength",
            "mastery", "challenge", "overcome", "perform", "performance", "determination",
            "just do it", "athlete",
        ],
        Archetype::Rebel => &[
            "break", "break rules", "rule breaking", "rebel", "outlaw", "defy", "defiant",
            "disrupt", "nonconformist", "unapologetic", "maverick", "against the grain",
            "anarchy", "riot", "unbound", "bold", "independent", "freedom", "smash", "refuse",
            "resist", "revolt",
        ],
        Archetype::Explorer => &[
            "explore", "discover", "adventure", "freedom", "wander", "roam", "journey",
            "trail", "frontier", "off road", "beyond", "horizon", "wild", "map", "path",
            "route", "expedition", "uncharted", "out there", "find your own way",
        ],
        Archetype::Creator => &[
            "create", "creative", "creativity", "imagine", "imagination", "design", "craft",
            "crafted", "build", "invent", "innovation", "original", "express", "artistry",
            "make", "vision",
        ],
        Archetype::Ruler => &[
            "leader", "leadership", "control", "premium", "luxury", "exclusive", "prestige",
            "authority", "stability", "order", "power", "elite", "heritage", "standard",
        ],
        Archetype::Magician => &[
            "magic", "magical", "transform", "transformation", "wonder", "dream", "dreams",
            "imagine", "vision", "visionary", "miracle", "spark", "mystical", "possibility",
        ],
        Archetype::Lover => &[
            "love", "passion", "passionate", "intimate", "intimacy", "sensual", "indulge",
            "indulgence", "romance", "romantic", "beauty", "desire", "pleasure", "elegant",
        ],
        Archetype::Caregiver => &[
            "care", "caring", "nurture", "nurturing", "protect", "protection", "support",
            "supportive", "safe", "safety", "compassion", "compassionate", "empathy", "gentle",
            "warm", "warmth", "embrace", "family", "trust", "wellbeing", "well being", "shield",
            "comfort", "soothe", "reassure", "healing", "kindness", "help", "tender", "listen",
        ],
        Archetype::Jester => &[
            "fun", "funny", "humor", "humour", "laugh", "joke", "jokes", "playful", "silly",
            "irreverent", "party", "prank", "enjoy", "entertain", "goofy",
        ],
        Archetype::Sage => &[
            "wisdom", "wise", "knowledge", "truth", "insight", "research", "expert",
            "expertise", "learn", "learning", "science", "understand", "understanding",
            "evidence", "study",
        ],
    }
}

/// Keyword evidence for a labelled text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexiconEvidence {
    /// Keywords of the label present in the text, in lexicon order.
    pub found: Vec<String>,
    /// First [`MISSING_LIMIT`] keywords of the label absent from the text.
    pub missing: Vec<String>,
    /// Matches for every archetype with at least one hit, keyed by label.
    pub found_all: BTreeMap<String, Vec<String>>,
    pub suggestions: Vec<String>,
}

/// Match every archetype's keywords against `text` and summarize them for
/// `label`.
#[must_use]
pub fn evidence(label: Archetype, text: &str) -> LexiconEvidence {
    let grams = ngram_set(&normalize_for_match(text));
    let mut found_all = BTreeMap::new();
    for archetype in Archetype::ALL {
        let hits = matches_in(archetype, &grams);
        if !hits.is_empty() {
            found_all.insert(archetype.label().to_string(), hits);
        }
    }

    let found = found_all.get(label.label()).cloned().unwrap_or_default();
    let missing: Vec<String> = keywords(label)
        .iter()
        .filter(|kw| !found.iter().any(|f| f.as_str() == **kw))
        .take(MISSING_LIMIT)
        .map(|kw| (*kw).to_string())
        .collect();
    let suggestions = suggestions(&missing);

    LexiconEvidence {
        found,
        missing,
        found_all,
        suggestions,
    }
}

/// Keywords for `archetype` that appear in `text`, in lexicon order.
#[must_use]
pub fn patterns_found(archetype: Archetype, text: &str) -> Vec<String> {
    matches_in(archetype, &ngram_set(&normalize_for_match(text)))
}

fn matches_in(archetype: Archetype, grams: &HashSet<String>) -> Vec<String> {
    keywords(archetype)
        .iter()
        .filter(|kw| grams.contains(&normalize_for_match(kw)))
        .map(|kw| (*kw).to_string())
        .collect()
}

fn suggestions(missing: &[String]) -> Vec<String> {
    let coverage = if missing.is_empty() {
        "Nice coverage of key words.".to_string()
    } else {
        let words: Vec<&str> = missing
            .iter()
            .take(SUGGESTED_WORDS)
            .map(String::as_str)
            .collect();
        format!("Use words like: {}", words.join(", "))
    };
    vec![
        coverage,
        "Use strong, direct verbs; cut corporate jargon.".to_string(),
    ]
}

/// Lower-case, dashes and slashes to spaces, other punctuation dropped,
/// whitespace collapsed.
fn normalize_for_match(input: &str) -> String {
    input
        .chars()
        .filter_map(|ch| {
            if ch.is_alphanumeric() {
                Some(ch.to_lowercase().next().unwrap_or(ch))
            } else if ch.is_whitespace() || matches!(ch, '-' | '–' | '—' | '_' | '/') {
                Some(' ')
            } else if ch == '\'' || ch == '’' {
                None
            } else {
                Some(' ')
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn ngram_set(normalized: &str) -> HashSet<String> {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let mut grams = HashSet::new();
    for n in 1..=3 {
        for window in tokens.windows(n) {
            grams.insert(window.join(" "));
        }
    }
    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_archetype_has_keywords() {
        for archetype in Archetype::ALL {
            assert!(!keywords(archetype).is_empty(), "{archetype}");
        }
    }

    #[test]
    fn matches_multiword_keywords_across_hyphens_and_punctuation() {
        let found = patterns_found(
            Archetype::Rebel,
            "We're Rule-Breaking by design; go against   the grain!",
        );
        assert_eq!(found, vec!["rule breaking", "against the grain"]);
    }

    #[test]
    fn matches_whole_words_only() {
        assert!(patterns_found(Archetype::Explorer, "a mapping tool").is_empty());
        assert_eq!(
            patterns_found(Archetype::Explorer, "Off-road trails, a new map."),
            vec!["off road", "map"]
        );
    }

    #[test]
    fn evidence_lists_missing_keywords_for_the_label() {
        let ev = evidence(Archetype::Explorer, "Explore the wild frontier. Have fun!");
        assert_eq!(ev.found, vec!["explore", "frontier", "wild"]);
        assert_eq!(ev.missing.len(), MISSING_LIMIT);
        assert_eq!(
            ev.missing[..4],
            ["discover", "adventure", "freedom", "wander"]
        );
        assert!(ev.missing.iter().all(|m| !ev.found.contains(m)));
        assert_eq!(
            ev.suggestions,
            vec![
                "Use words like: discover, adventure, freedom, wander, roam".to_string(),
                "Use strong, direct verbs; cut corporate jargon.".to_string(),
            ]
        );
    }

    #[test]
    fn evidence_reports_hits_for_every_matching_archetype() {
        let ev = evidence(Archetype::Explorer, "Explore the wild frontier. Have fun!");
        assert_eq!(ev.found_all.get("Jester"), Some(&vec!["fun".to_string()]));
        assert_eq!(
            ev.found_all.get("Explorer"),
            Some(&vec![
                "explore".to_string(),
                "frontier".to_string(),
                "wild".to_string()
            ])
        );
        assert!(!ev.found_all.contains_key("Sage"));
    }

    #[test]
    fn full_coverage_is_acknowledged() {
        let text = keywords(Archetype::Sage).join(". ");
        let ev = evidence(Archetype::Sage, &text);
        assert!(ev.missing.is_empty());
        assert_eq!(ev.suggestions[0], "Nice coverage of key words.");
    }

    #[test]
    fn empty_text_has_no_patterns() {
        assert!(patterns_found(Archetype::Caregiver, "").is_empty());
    }
}

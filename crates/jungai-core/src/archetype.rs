//! The fixed twelve-archetype taxonomy and source-kind vocabulary.

use serde::{Deserialize, Serialize};

/// One of the twelve fixed brand archetypes.
///
/// Serializes as its canonical label (`"Rebel"`, `"Caregiver"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    Innocent,
    Everyman,
    Hero,
    Rebel,
    Explorer,
    Creator,
    Ruler,
    Magician,
    Lover,
    Caregiver,
    Jester,
    Sage,
}

impl Archetype {
    /// Every label, in prompt order.
    pub const ALL: [Archetype; 12] = [
        Archetype::Innocent,
        Archetype::Everyman,
        Archetype::Hero,
        Archetype::Rebel,
        Archetype::Explorer,
        Archetype::Creator,
        Archetype::Ruler,
        Archetype::Magician,
        Archetype::Lover,
        Archetype::Caregiver,
        Archetype::Jester,
        Archetype::Sage,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Archetype::Innocent => "Innocent",
            Archetype::Everyman => "Everyman",
            Archetype::Hero => "Hero",
            Archetype::Rebel => "Rebel",
            Archetype::Explorer => "Explorer",
            Archetype::Creator => "Creator",
            Archetype::Ruler => "Ruler",
            Archetype::Magician => "Magician",
            Archetype::Lover => "Lover",
            Archetype::Caregiver => "Caregiver",
            Archetype::Jester => "Jester",
            Archetype::Sage => "Sage",
        }
    }

    /// One-line description used in the classification prompt.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Archetype::Innocent => "optimistic, pure, simple; promises safety and goodness",
            Archetype::Everyman => "down-to-earth, relatable, belonging; for ordinary people",
            Archetype::Hero => "courageous, competitive, mastery; proves worth through action",
            Archetype::Rebel => "disruptive, rule-breaking, liberation; overturns what isn't working",
            Archetype::Explorer => "freedom, discovery, adventure; finds fulfilment beyond the map",
            Archetype::Creator => "imaginative, expressive, innovative; builds things of enduring value",
            Archetype::Ruler => "control, stability, leadership; creates order and prosperity",
            Archetype::Magician => "transformation, vision, wonder; makes dreams come true",
            Archetype::Lover => "intimacy, passion, sensuality; connection and indulgence",
            Archetype::Caregiver => "nurturing, protective, compassionate; serves and cares for others",
            Archetype::Jester => "playful, humorous, irreverent; lives in the moment with joy",
            Archetype::Sage => "wisdom, knowledge, truth; understands the world through insight",
        }
    }

    /// Lower-case names that map to this archetype, canonical label first.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Archetype::Innocent => &["innocent"],
            Archetype::Everyman => &[
                "everyman",
                "everyperson",
                "everywoman",
                "regular guy",
                "regular guy gal",
                "orphan",
            ],
            Archetype::Hero => &["hero", "warrior"],
            Archetype::Rebel => &["rebel", "outlaw", "revolutionary"],
            Archetype::Explorer => &["explorer", "seeker"],
            Archetype::Creator => &["creator", "artist"],
            Archetype::Ruler => &["ruler", "leader", "sovereign"],
            Archetype::Magician => &["magician", "visionary"],
            Archetype::Lover => &["lover"],
            Archetype::Caregiver => &["caregiver", "care giver"],
            Archetype::Jester => &["jester", "fool", "entertainer"],
            Archetype::Sage => &["sage", "mentor"],
        }
    }

    /// Map a free-form label to an archetype.
    ///
    /// Matching ignores case, punctuation, and a leading "the"; known aliases
    /// (`Outlaw`, `Regular Guy`, `Fool`, ...) resolve to their canonical label.
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        let normalized = normalize_label(raw);
        let key = normalized.strip_prefix("the ").unwrap_or(&normalized);
        if key.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|archetype| archetype.aliases().contains(&key))
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown archetype label: '{s}'"))
    }
}

/// Lower-case, map non-alphanumerics to spaces, collapse whitespace.
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which external provider family a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Search,
    VideoTranscript,
    Discussion,
    /// Text posted directly for classification rather than collected.
    Submitted,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Search => "search",
            SourceKind::VideoTranscript => "video_transcript",
            SourceKind::Discussion => "discussion",
            SourceKind::Submitted => "submitted",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

use serde::{Deserialize, Serialize};

/// Sentinel title used when an EXTINF line carries no usable title
pub const UNKNOWN_CHANNEL_NAME: &str = "Unknown Channel";

/// Input feed a channel record originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Worldwide aggregated feed
    Global,
    /// Regionally curated feed (wins name conflicts against `Global` by default)
    Regional,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Global => "global",
            Source::Regional => "regional",
        }
    }

    /// Parse a source tag, case-insensitive
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "global" => Some(Source::Global),
            "regional" => Some(Source::Regional),
            _ => None,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A playable channel extracted from a playlist document.
///
/// Records are only built by the parser and never mutated afterwards.
/// `id` is `"{source}-{ordinal}-{name}"`, where `ordinal` counts records
/// already emitted for the same source in the same parse run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub source: Source,
}

impl ChannelRecord {
    /// Build the per-run identifier for a record
    pub fn make_id(source: Source, ordinal: usize, name: &str) -> String {
        format!("{}-{}-{}", source, ordinal, name)
    }
}

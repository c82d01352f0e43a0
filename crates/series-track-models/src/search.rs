use serde::{Deserialize, Serialize};

/// One candidate from a provider name search, trimmed to what the UI needs to
/// disambiguate shows with similar names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub seasons: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<u16>,
    #[serde(default)]
    pub genres: Vec<String>,
}

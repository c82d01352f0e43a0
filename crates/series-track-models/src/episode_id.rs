use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of the encoded form: four digits of season, four of episode.
pub const ENCODED_WIDTH: usize = 8;

/// Synthetic episode identifier: season-major, episode-minor.
///
/// The encoded form is a fixed-width digit string (`SSSSEEEE`) whose lexical
/// order matches the numeric order of `(season, episode)`, so it can be used
/// both as a sorted-set member key and as a sorted-set score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EpisodeId {
    season: u16,
    episode: u16,
}

impl EpisodeId {
    pub fn new(season: u16, episode: u16) -> Self {
        Self { season, episode }
    }

    pub fn season(&self) -> u16 {
        self.season
    }

    pub fn episode(&self) -> u16 {
        self.episode
    }

    /// Numeric view of the encoded form, for use as a sorted-set score.
    /// Fits exactly in an f64 (max value 9999_9999 < 2^53).
    pub fn score(&self) -> f64 {
        (self.season as u32 * 10_000 + self.episode as u32) as f64
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:04}", self.season, self.episode)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("malformed episode id {0:?}: expected {ENCODED_WIDTH} digits")]
pub struct ParseEpisodeIdError(pub String);

impl FromStr for EpisodeId {
    type Err = ParseEpisodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ENCODED_WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseEpisodeIdError(s.to_string()));
        }

        let (season, episode) = s.split_at(4);
        Ok(Self {
            season: season.parse().map_err(|_| ParseEpisodeIdError(s.to_string()))?,
            episode: episode.parse().map_err(|_| ParseEpisodeIdError(s.to_string()))?,
        })
    }
}

impl From<EpisodeId> for String {
    fn from(id: EpisodeId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for EpisodeId {
    type Error = ParseEpisodeIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

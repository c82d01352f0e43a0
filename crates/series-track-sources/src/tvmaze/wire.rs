//! Wire format of the TVMaze-style metadata API and conversions into our
//! models. The provider's vocabulary (statuses, embedded episode lists,
//! update maps) is normalized here so nothing upstream-shaped leaks past this
//! module.

use crate::traits::{ChangedShows, FullShow};
use serde::Deserialize;
use series_track_models::{AirDate, Episode, EpisodeId, PosterCandidate, SearchResult, Show, ShowStatus};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub show: WireShow,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireShow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub ended: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub seasons: Option<u32>,
    #[serde(default)]
    pub network: Option<WireNetwork>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<WireEmbedded>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireNetwork {
    pub name: String,
    #[serde(default)]
    pub country: Option<WireCountry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCountry {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEmbedded {
    #[serde(default)]
    pub episodes: Vec<WireEpisode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEpisode {
    pub season: i64,
    /// Null for specials, which carry no regular numbering and are skipped.
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub airdate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireImage {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub resolutions: Option<WireResolutions>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub votes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResolutions {
    #[serde(default)]
    pub original: Option<WireImageUrl>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireImageUrl {
    pub url: String,
}

fn map_status(status: Option<String>) -> ShowStatus {
    let Some(status) = status else {
        return ShowStatus::Other("Unknown".to_string());
    };

    match status.as_str() {
        "Running" => ShowStatus::Returning,
        "Ended" => ShowStatus::Ended,
        "In Development" => ShowStatus::NewSeries,
        _ => ShowStatus::from(status),
    }
}

fn parse_air_date(raw: Option<&str>) -> AirDate {
    match raw {
        Some(s) if !s.is_empty() => s.parse().unwrap_or(AirDate::UNKNOWN),
        _ => AirDate::UNKNOWN,
    }
}

impl WireShow {
    pub(crate) fn into_full_show(self) -> FullShow {
        let mut episodes: Vec<Episode> = self
            .embedded
            .map(|e| e.episodes)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|ep| {
                let number = ep.number?;
                let season = u16::try_from(ep.season).ok()?;
                let number = u16::try_from(number).ok()?;
                Some(Episode {
                    id: EpisodeId::new(season, number),
                    title: ep.name.unwrap_or_default(),
                    air_date: parse_air_date(ep.airdate.as_deref()),
                })
            })
            .collect();
        episodes.sort_by_key(|e| e.id);
        episodes.dedup_by_key(|e| e.id);

        let seasons = self.seasons.unwrap_or_else(|| {
            episodes.iter().map(|e| e.season()).collect::<BTreeSet<_>>().len() as u32
        });

        let first_aired = self.premiered.as_deref().and_then(|s| s.parse::<AirDate>().ok());
        let last_aired = self.ended.as_deref().and_then(|s| s.parse::<AirDate>().ok());

        let (country, network) = match self.network {
            Some(n) => (n.country.and_then(|c| c.code), Some(n.name)),
            None => (None, None),
        };

        FullShow {
            show: Show {
                id: self.id.to_string(),
                name: self.name,
                status: map_status(self.status),
                country,
                network,
                seasons,
                first_aired,
                last_aired,
            },
            episodes,
        }
    }

    pub(crate) fn into_search_result(self) -> SearchResult {
        let started = self.premiered.as_deref().and_then(|s| s.parse::<AirDate>().ok());
        let ended = self.ended.as_deref().and_then(|s| s.parse::<AirDate>().ok());

        SearchResult {
            id: self.id.to_string(),
            name: self.name,
            seasons: self.seasons.unwrap_or(0),
            started: started.filter(|d| !d.is_unknown()).map(|d| d.year()),
            ended: ended.filter(|d| !d.is_unknown()).map(|d| d.year()),
            genres: self.genres,
        }
    }
}

pub(crate) fn changed_shows_from_updates(
    updates: HashMap<String, i64>,
    since: Option<i64>,
) -> ChangedShows {
    let floor = since.unwrap_or(0);

    let mut show_ids = Vec::new();
    let mut watermark = floor;

    for (id, stamp) in updates {
        watermark = watermark.max(stamp);
        if stamp > floor {
            show_ids.push(id);
        }
    }
    show_ids.sort();

    ChangedShows { show_ids, watermark }
}

pub(crate) fn posters_from_images(images: Vec<WireImage>) -> Vec<PosterCandidate> {
    images
        .into_iter()
        .filter(|img| img.kind.as_deref() == Some("poster"))
        .filter_map(|img| {
            let url = img.resolutions.and_then(|r| r.original).map(|o| o.url)?;
            Some(PosterCandidate {
                image_ref: url,
                rating: img.rating.unwrap_or(0.0),
                voters: img.votes.unwrap_or(0),
            })
        })
        .collect()
}

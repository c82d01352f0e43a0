use crate::air_date::AirDate;
use crate::episode_id::EpisodeId;
use serde::{Deserialize, Serialize};

/// One episode of a show. Serialized as JSON into the per-show episode index,
/// keyed and scored by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub title: String,
    pub air_date: AirDate,
}

impl Episode {
    pub fn season(&self) -> u16 {
        self.id.season()
    }

    pub fn number(&self) -> u16 {
        self.id.episode()
    }
}

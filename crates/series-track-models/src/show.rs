use crate::air_date::AirDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status as reported by the metadata provider. Values the provider
/// invents that we do not recognize are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ShowStatus {
    Returning,
    Ended,
    NewSeries,
    FinalSeason,
    Other(String),
}

impl ShowStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ShowStatus::Returning => "Returning Series",
            ShowStatus::Ended => "Ended",
            ShowStatus::NewSeries => "New Series",
            ShowStatus::FinalSeason => "Final Season",
            ShowStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for ShowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ShowStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Returning Series" => ShowStatus::Returning,
            "Ended" | "Canceled/Ended" => ShowStatus::Ended,
            "New Series" => ShowStatus::NewSeries,
            "Final Season" => ShowStatus::FinalSeason,
            _ => ShowStatus::Other(s),
        }
    }
}

impl From<ShowStatus> for String {
    fn from(status: ShowStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Shared show record. One copy exists per show regardless of how many users
/// subscribe to it; lifetime is governed by the reference count kept in the
/// store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: String,
    pub name: String,
    pub status: ShowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub seasons: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_aired: Option<AirDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_aired: Option<AirDate>,
}

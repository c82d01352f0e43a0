use serde::{Deserialize, Serialize};

/// A community poster offered by the provider, with its rating and how many
/// people voted on it. Ranking happens in the poster cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterCandidate {
    pub image_ref: String,
    pub rating: f64,
    pub voters: u32,
}

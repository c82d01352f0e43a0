use crate::error::SourceError;
use async_trait::async_trait;
use series_track_models::{Episode, PosterCandidate, SearchResult, Show};

/// Everything the provider knows about one show: metadata plus the complete
/// episode list, fetched in a single call so ingestion can replace the local
/// record wholesale.
#[derive(Debug, Clone)]
pub struct FullShow {
    pub show: Show,
    pub episodes: Vec<Episode>,
}

/// Result of a changed-shows poll. `watermark` is the value to store and hand
/// back on the next poll; it only moves forward.
#[derive(Debug, Clone)]
pub struct ChangedShows {
    pub show_ids: Vec<String>,
    pub watermark: i64,
}

/// The upstream metadata provider, as the store sees it.
///
/// Implementations report transient trouble through `SourceError::Http` /
/// `Status` so the caller's retry policy can distinguish it from structural
/// failures (`NotFound`, `Malformed`), which are never retried.
#[async_trait]
pub trait ShowMetadataSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError>;

    async fn fetch_full_show(&self, show_id: &str) -> Result<FullShow, SourceError>;

    /// Shows changed upstream since `since` (a previously returned watermark;
    /// `None` means "everything you have").
    async fn fetch_changed_shows(&self, since: Option<i64>) -> Result<ChangedShows, SourceError>;

    async fn fetch_poster_candidates(&self, show_id: &str)
        -> Result<Vec<PosterCandidate>, SourceError>;

    async fn fetch_image(&self, image_ref: &str) -> Result<Vec<u8>, SourceError>;
}

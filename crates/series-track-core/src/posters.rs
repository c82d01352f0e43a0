use crate::error::{Result, StoreError};
use series_track_models::PosterCandidate;
use series_track_sources::{with_retry, RetryPolicy, ShowMetadataSource, SourceError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a poster download that is allowed to "fail" without being an
/// error: the provider simply may not have the referenced image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterStatus {
    Saved,
    NotFound,
}

/// Poster files on disk: one shared `<show>.jpg` per show, plus optional
/// per-user overrides under `<user>/<show>.jpg`.
#[derive(Clone)]
pub struct PosterCache {
    dir: PathBuf,
    source: Arc<dyn ShowMetadataSource>,
    retry: RetryPolicy,
}

impl PosterCache {
    pub fn new(
        dir: impl Into<PathBuf>,
        source: Arc<dyn ShowMetadataSource>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, source, retry })
    }

    fn shared_path(&self, show_id: &str) -> PathBuf {
        self.dir.join(format!("{show_id}.jpg"))
    }

    fn user_path(&self, username: &str, show_id: &str) -> PathBuf {
        self.dir.join(username).join(format!("{show_id}.jpg"))
    }

    /// The poster to display: the user's override when present, else the
    /// shared one, else nothing.
    pub fn filename_for(&self, show_id: &str, username: Option<&str>) -> Option<PathBuf> {
        if let Some(user) = username {
            let override_path = self.user_path(user, show_id);
            if override_path.exists() {
                return Some(override_path);
            }
        }

        let shared = self.shared_path(show_id);
        shared.exists().then_some(shared)
    }

    /// Download a user-chosen poster. Persists only when the provider serves
    /// the image; a dead reference is reported as `NotFound` rather than an
    /// error so the caller can tell it apart from provider downtime.
    pub async fn set_custom(
        &self,
        username: &str,
        show_id: &str,
        image_ref: &str,
    ) -> Result<PosterStatus> {
        let bytes = match with_retry(&self.retry, || self.source.fetch_image(image_ref)).await {
            Ok(bytes) => bytes,
            Err(SourceError::NotFound) => return Ok(PosterStatus::NotFound),
            Err(e) => return Err(StoreError::upstream(e)),
        };

        let path = self.user_path(username, show_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        info!(username, show_id, "saved custom poster");

        Ok(PosterStatus::Saved)
    }

    /// Remove a user's override. Returns false when there was nothing to
    /// delete. The per-user directory is pruned once empty; a directory that
    /// still has other posters in it is left alone.
    pub fn delete_custom(&self, username: &str, show_id: &str) -> Result<bool> {
        let path = self.user_path(username, show_id);
        if !path.exists() {
            return Ok(false);
        }

        std::fs::remove_file(&path)?;

        if let Some(parent) = path.parent() {
            prune_dir(parent)?;
        }

        Ok(true)
    }

    pub(crate) fn remove_shared(&self, show_id: &str) -> std::io::Result<()> {
        let path = self.shared_path(show_id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn has_shared(&self, show_id: &str) -> bool {
        self.shared_path(show_id).exists()
    }

    /// Fetch the provider's poster candidates and keep the best-rated one as
    /// the shared poster. A show with no candidates simply stays posterless.
    pub async fn download_default(&self, show_id: &str) -> Result<Option<PathBuf>> {
        let candidates =
            with_retry(&self.retry, || self.source.fetch_poster_candidates(show_id))
                .await
                .map_err(StoreError::upstream)?;

        let Some(best) = pick_poster(candidates) else {
            debug!(show_id, "no poster candidates");
            return Ok(None);
        };

        let bytes = match with_retry(&self.retry, || self.source.fetch_image(&best.image_ref)).await
        {
            Ok(bytes) => bytes,
            Err(SourceError::NotFound) => return Ok(None),
            Err(e) => return Err(StoreError::upstream(e)),
        };

        let path = self.shared_path(show_id);
        std::fs::write(&path, bytes)?;
        info!(show_id, poster = best.image_ref, "saved default poster");

        Ok(Some(path))
    }
}

fn prune_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Choose the candidate with the highest popularity-weighted rating:
/// `rating * (voters / max voters among candidates)`, so a perfect score from
/// a handful of voters does not beat a good score from many. Zero voters
/// weigh zero. Ties keep the provider's original order.
pub fn pick_poster(candidates: Vec<PosterCandidate>) -> Option<PosterCandidate> {
    let max_voters = candidates.iter().map(|c| c.voters).max()?;

    let weighted = |c: &PosterCandidate| {
        if c.voters == 0 || max_voters == 0 {
            0.0
        } else {
            c.rating * (c.voters as f64 / max_voters as f64)
        }
    };

    let mut best: Option<(f64, PosterCandidate)> = None;
    for candidate in candidates {
        let score = weighted(&candidate);
        match &best {
            Some((top, _)) if score <= *top => {}
            _ => best = Some((score, candidate)),
        }
    }

    best.map(|(_, candidate)| candidate)
}

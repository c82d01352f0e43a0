use crate::error::{Result, StoreError};
use crate::keys::{self, show_fields, update_fields};
use crate::kv::{Batch, Kv, ScoreBound};
use crate::library::normalize_username;
use crate::posters::PosterCache;
use series_track_models::{AirDate, Episode, EpisodeId, SearchResult, Show, ShowStatus};
use series_track_sources::{with_retry, FullShow, RetryPolicy, ShowMetadataSource};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Options for [`ShowStore::get_show_info`].
#[derive(Debug, Clone, Default)]
pub struct ShowInfoOptions {
    pub with_episodes: bool,
    pub episode_limit: Option<usize>,
    /// Restrict the episode slice to identifiers strictly greater than the
    /// user's watch marker. Without a marker everything is unseen.
    pub only_unseen: bool,
}

/// Read-only view of a show for one user.
#[derive(Debug, Clone)]
pub struct ShowInfo {
    pub show: Show,
    pub last_seen: Option<EpisodeId>,
    pub poster: Option<PathBuf>,
    /// Present only when requested via `with_episodes`.
    pub episodes: Option<Vec<Episode>>,
}

/// Outcome of one refresh sweep.
#[derive(Debug, Default)]
pub struct UpdateSummary {
    pub checked: usize,
    pub updated: Vec<String>,
    pub failed: Vec<String>,
    pub watermark: i64,
}

/// Shared show records and their episode indexes.
///
/// One record exists per show across all users; the `shows` refcount hash
/// governs its lifetime. All multi-key writes go through an atomic batch so a
/// reader never sees a fresh episode index next to stale metadata.
pub struct ShowStore {
    kv: Arc<dyn Kv>,
    source: Arc<dyn ShowMetadataSource>,
    posters: PosterCache,
    retry: RetryPolicy,
}

impl ShowStore {
    pub fn new(
        kv: Arc<dyn Kv>,
        source: Arc<dyn ShowMetadataSource>,
        posters: PosterCache,
        retry: RetryPolicy,
    ) -> Self {
        Self { kv, source, posters, retry }
    }

    pub fn posters(&self) -> &PosterCache {
        &self.posters
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        with_retry(&self.retry, || self.source.search(query))
            .await
            .map_err(StoreError::upstream)
    }

    pub async fn exists(&self, show_id: &str) -> Result<bool> {
        self.kv.exists(&keys::show(show_id)).await
    }

    /// Pull the show from the provider and replace the local record and its
    /// full episode index in one atomic batch. Re-running with an unchanged
    /// upstream payload stores byte-identical state.
    pub async fn ingest_show(&self, show_id: &str) -> Result<()> {
        let full = with_retry(&self.retry, || self.source.fetch_full_show(show_id))
            .await
            .map_err(StoreError::upstream)?;

        let batch = build_ingest_batch(show_id, &full)?;
        self.kv.apply(batch).await?;
        info!(show_id, episodes = full.episodes.len(), "ingested show");

        // Best-effort: a missing poster never fails the ingestion.
        if !self.posters.has_shared(show_id) {
            if let Err(e) = self.posters.download_default(show_id).await {
                warn!(show_id, error = %e, "default poster fetch failed");
            }
        }

        Ok(())
    }

    /// Re-ingest every locally known show the provider reports as changed
    /// since the stored watermark. Individual show failures are logged and
    /// skipped; the watermark advances once the sweep has run to completion.
    pub async fn refresh_changed_shows(&self, inter_show_delay: Duration) -> Result<UpdateSummary> {
        let known: HashSet<String> =
            self.kv.hkeys(keys::SHOW_REFCOUNTS).await?.into_iter().collect();

        let since = self
            .kv
            .hget(keys::UPDATES, update_fields::WATERMARK)
            .await?
            .and_then(|raw| raw.parse::<i64>().ok());

        let changed = with_retry(&self.retry, || self.source.fetch_changed_shows(since))
            .await
            .map_err(StoreError::upstream)?;

        let to_update: Vec<String> = changed
            .show_ids
            .into_iter()
            .filter(|id| known.contains(id))
            .collect();

        info!(changed = to_update.len(), known = known.len(), "starting refresh sweep");

        let mut summary = UpdateSummary {
            checked: to_update.len(),
            watermark: changed.watermark,
            ..UpdateSummary::default()
        };

        for (i, show_id) in to_update.iter().enumerate() {
            match self.ingest_show(show_id).await {
                Ok(()) => summary.updated.push(show_id.clone()),
                Err(e) => {
                    warn!(show_id, error = %e, "refresh failed for show, skipping");
                    summary.failed.push(show_id.clone());
                }
            }

            if i + 1 < to_update.len() {
                tokio::time::sleep(inter_show_delay).await;
            }
        }

        self.kv
            .hset(keys::UPDATES, update_fields::WATERMARK, &changed.watermark.to_string())
            .await?;

        info!(
            updated = summary.updated.len(),
            failed = summary.failed.len(),
            watermark = summary.watermark,
            "refresh sweep done"
        );

        Ok(summary)
    }

    pub async fn get_show_info(
        &self,
        username: &str,
        show_id: &str,
        options: &ShowInfoOptions,
    ) -> Result<ShowInfo> {
        let username = normalize_username(username);
        let show = self.read_show(show_id).await?;
        let last_seen = self.last_seen(&username, show_id).await?;
        let poster = self.posters.filename_for(show_id, Some(&username));

        let episodes = if options.with_episodes {
            let min = if options.only_unseen {
                match last_seen {
                    Some(marker) => ScoreBound::Excl(marker.score()),
                    None => ScoreBound::NegInf,
                }
            } else {
                ScoreBound::NegInf
            };
            Some(self.episodes_in_range(show_id, min, options.episode_limit).await?)
        } else {
            None
        };

        Ok(ShowInfo { show, last_seen, poster, episodes })
    }

    pub async fn episodes(&self, show_id: &str) -> Result<Vec<Episode>> {
        self.episodes_in_range(show_id, ScoreBound::NegInf, None).await
    }

    pub async fn has_episode(&self, show_id: &str, episode: EpisodeId) -> Result<bool> {
        let score = episode.score();
        let count = self
            .kv
            .zcount(
                &keys::show_episodes(show_id),
                ScoreBound::Incl(score),
                ScoreBound::Incl(score),
            )
            .await?;
        Ok(count != 0)
    }

    pub async fn last_seen(&self, username: &str, show_id: &str) -> Result<Option<EpisodeId>> {
        match self.kv.hget(&keys::user_last_seen(username), show_id).await? {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| StoreError::Corrupt(format!("watch marker: {e}"))),
            None => Ok(None),
        }
    }

    pub(crate) async fn increment_ref(&self, show_id: &str) -> Result<i64> {
        self.kv.hincrby(keys::SHOW_REFCOUNTS, show_id, 1).await
    }

    /// Drop one subscriber reference. Hitting zero deletes the show record,
    /// its episode index, its refcount field, and the shared poster.
    pub(crate) async fn decrement_ref(&self, show_id: &str) -> Result<()> {
        let refcount = self.kv.hincrby(keys::SHOW_REFCOUNTS, show_id, -1).await?;
        if refcount > 0 {
            return Ok(());
        }

        let mut batch = Batch::new();
        batch.del(vec![keys::show(show_id), keys::show_episodes(show_id)]);
        batch.hdel(keys::SHOW_REFCOUNTS, show_id);
        self.kv.apply(batch).await?;

        if let Err(e) = self.posters.remove_shared(show_id) {
            warn!(show_id, error = %e, "failed to remove shared poster");
        }

        info!(show_id, "last subscriber gone, deleted show");
        Ok(())
    }

    async fn read_show(&self, show_id: &str) -> Result<Show> {
        let key = keys::show(show_id);
        if !self.kv.exists(&key).await? {
            return Err(StoreError::NotFound);
        }

        let required = |field: &'static str, value: Option<String>| {
            value.ok_or_else(|| StoreError::Corrupt(format!("show record missing {field}")))
        };

        let name = required(show_fields::NAME, self.kv.hget(&key, show_fields::NAME).await?)?;
        let status =
            required(show_fields::STATUS, self.kv.hget(&key, show_fields::STATUS).await?)?;
        let seasons =
            required(show_fields::SEASONS, self.kv.hget(&key, show_fields::SEASONS).await?)?
                .parse::<u32>()
                .map_err(|e| StoreError::Corrupt(format!("show seasons: {e}")))?;

        let country = self.kv.hget(&key, show_fields::COUNTRY).await?;
        let network = self.kv.hget(&key, show_fields::NETWORK).await?;

        let parse_date = |value: Option<String>| -> Result<Option<AirDate>> {
            value
                .map(|raw| {
                    raw.parse()
                        .map_err(|e| StoreError::Corrupt(format!("show air date: {e}")))
                })
                .transpose()
        };
        let first_aired = parse_date(self.kv.hget(&key, show_fields::FIRST_AIRED).await?)?;
        let last_aired = parse_date(self.kv.hget(&key, show_fields::LAST_AIRED).await?)?;

        Ok(Show {
            id: show_id.to_string(),
            name,
            status: ShowStatus::from(status),
            country,
            network,
            seasons,
            first_aired,
            last_aired,
        })
    }

    async fn episodes_in_range(
        &self,
        show_id: &str,
        min: ScoreBound,
        limit: Option<usize>,
    ) -> Result<Vec<Episode>> {
        let rows = self
            .kv
            .zrange_by_score(&keys::show_episodes(show_id), min, ScoreBound::PosInf, limit)
            .await?;

        rows.iter()
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| StoreError::Corrupt(format!("episode record: {e}")))
            })
            .collect()
    }
}

/// Everything ingestion writes, as one atomic unit: delete both keys, rewrite
/// the metadata hash, re-add every episode.
fn build_ingest_batch(show_id: &str, full: &FullShow) -> Result<Batch> {
    let show_key = keys::show(show_id);
    let index_key = keys::show_episodes(show_id);

    // The provider's own date fields are not always usable; fall back to the
    // episode list, which is ordered by identifier at this point.
    let known = |d: &AirDate| !d.is_unknown();
    let first_aired = full
        .show
        .first_aired
        .filter(known)
        .or_else(|| full.episodes.iter().map(|e| e.air_date).find(known));
    let last_aired = if full.show.last_aired.is_some() {
        full.show
            .last_aired
            .filter(known)
            .or_else(|| full.episodes.iter().rev().map(|e| e.air_date).find(known))
    } else {
        None
    };

    let mut batch = Batch::new();
    batch.del(vec![show_key.clone(), index_key.clone()]);

    batch.hset(&show_key, show_fields::NAME, &full.show.name);
    batch.hset(&show_key, show_fields::STATUS, full.show.status.as_str());
    batch.hset(&show_key, show_fields::SEASONS, &full.show.seasons.to_string());
    if let Some(country) = &full.show.country {
        batch.hset(&show_key, show_fields::COUNTRY, country);
    }
    if let Some(network) = &full.show.network {
        batch.hset(&show_key, show_fields::NETWORK, network);
    }
    if let Some(first) = first_aired {
        batch.hset(&show_key, show_fields::FIRST_AIRED, &first.to_string());
    }
    if let Some(last) = last_aired {
        batch.hset(&show_key, show_fields::LAST_AIRED, &last.to_string());
    }

    for episode in &full.episodes {
        let record = serde_json::to_string(episode)
            .map_err(|e| StoreError::Corrupt(format!("episode encode: {e}")))?;
        batch.zadd(&index_key, episode.id.score(), &record);
    }

    Ok(batch)
}

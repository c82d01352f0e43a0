//! In-memory doubles shared by the crate's tests: a `Kv` backed by a mutexed
//! map and a scriptable `ShowMetadataSource`.

use crate::error::Result;
use crate::kv::{Batch, BatchOp, Kv, ScoreBound};
use crate::library::UserLibrary;
use crate::posters::PosterCache;
use crate::store::ShowStore;
use async_trait::async_trait;
use series_track_models::{AirDate, Episode, EpisodeId, PosterCandidate, SearchResult, Show, ShowStatus};
use series_track_sources::{ChangedShows, FullShow, RetryPolicy, ShowMetadataSource, SourceError};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Entry {
    Hash(HashMap<String, String>),
    ZSet(Vec<(f64, String)>),
}

#[derive(Default)]
pub(crate) struct MemoryKv {
    inner: Mutex<HashMap<String, Entry>>,
}

fn hash_of<'a>(map: &'a mut HashMap<String, Entry>, key: &str) -> &'a mut HashMap<String, String> {
    match map.entry(key.to_string()).or_insert_with(|| Entry::Hash(HashMap::new())) {
        Entry::Hash(h) => h,
        Entry::ZSet(_) => panic!("key {key} holds a zset, expected a hash"),
    }
}

fn zset_of<'a>(map: &'a mut HashMap<String, Entry>, key: &str) -> &'a mut Vec<(f64, String)> {
    match map.entry(key.to_string()).or_insert_with(|| Entry::ZSet(Vec::new())) {
        Entry::ZSet(z) => z,
        Entry::Hash(_) => panic!("key {key} holds a hash, expected a zset"),
    }
}

fn sort_zset(zset: &mut Vec<(f64, String)>) {
    zset.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)));
}

fn apply_op(map: &mut HashMap<String, Entry>, op: &BatchOp) {
    match op {
        BatchOp::Del(keys) => {
            for key in keys {
                map.remove(key);
            }
        }
        BatchOp::HSet { key, field, value } => {
            hash_of(map, key).insert(field.clone(), value.clone());
        }
        BatchOp::HDel { key, field } => {
            let empty = {
                let hash = hash_of(map, key);
                hash.remove(field);
                hash.is_empty()
            };
            if empty {
                map.remove(key);
            }
        }
        BatchOp::ZAdd { key, score, member } => {
            let zset = zset_of(map, key);
            if let Some(existing) = zset.iter_mut().find(|(_, m)| m == member) {
                existing.0 = *score;
            } else {
                zset.push((*score, member.clone()));
            }
            sort_zset(zset);
        }
    }
}

#[async_trait]
impl Kv for MemoryKv {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let map = self.inner.lock().unwrap();
        Ok(match map.get(key) {
            Some(Entry::Hash(h)) => h.get(field).cloned(),
            _ => None,
        })
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut map = self.inner.lock().unwrap();
        hash_of(&mut map, key).insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let mut map = self.inner.lock().unwrap();
        let Some(Entry::Hash(h)) = map.get_mut(key) else {
            return Ok(false);
        };
        let existed = h.remove(field).is_some();
        if h.is_empty() {
            map.remove(key);
        }
        Ok(existed)
    }

    async fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        let map = self.inner.lock().unwrap();
        Ok(match map.get(key) {
            Some(Entry::Hash(h)) => h.keys().cloned().collect(),
            _ => Vec::new(),
        })
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut map = self.inner.lock().unwrap();
        let hash = hash_of(&mut map, key);
        let current: i64 = hash.get(field).and_then(|v| v.parse().ok()).unwrap_or(0);
        let next = current + delta;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.inner.lock().unwrap().contains_key(key))
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        let mut map = self.inner.lock().unwrap();
        let zset = zset_of(&mut map, key);
        let added = if let Some(existing) = zset.iter_mut().find(|(_, m)| m == member) {
            existing.0 = score;
            false
        } else {
            zset.push((score, member.to_string()));
            true
        };
        sort_zset(zset);
        Ok(added)
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        let mut map = self.inner.lock().unwrap();
        let Some(Entry::ZSet(zset)) = map.get_mut(key) else {
            return Ok(false);
        };
        let before = zset.len();
        zset.retain(|(_, m)| m != member);
        let removed = zset.len() < before;
        if zset.is_empty() {
            map.remove(key);
        }
        Ok(removed)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let map = self.inner.lock().unwrap();
        Ok(match map.get(key) {
            Some(Entry::ZSet(zset)) => {
                zset.iter().find(|(_, m)| m == member).map(|(score, _)| *score)
            }
            _ => None,
        })
    }

    async fn zscores(&self, key: &str, members: &[String]) -> Result<Vec<Option<f64>>> {
        let mut scores = Vec::with_capacity(members.len());
        for member in members {
            scores.push(self.zscore(key, member).await?);
        }
        Ok(scores)
    }

    async fn zmin_score(&self, key: &str) -> Result<Option<f64>> {
        let map = self.inner.lock().unwrap();
        Ok(match map.get(key) {
            Some(Entry::ZSet(zset)) => zset.first().map(|(score, _)| *score),
            _ => None,
        })
    }

    async fn zcount(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<u64> {
        let map = self.inner.lock().unwrap();
        Ok(match map.get(key) {
            Some(Entry::ZSet(zset)) => zset
                .iter()
                .filter(|(score, _)| min.admits_lower(*score) && max.admits_upper(*score))
                .count() as u64,
            _ => 0,
        })
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let map = self.inner.lock().unwrap();
        let mut members: Vec<String> = match map.get(key) {
            Some(Entry::ZSet(zset)) => zset
                .iter()
                .filter(|(score, _)| min.admits_lower(*score) && max.admits_upper(*score))
                .map(|(_, member)| member.clone())
                .collect(),
            _ => Vec::new(),
        };
        if let Some(limit) = limit {
            members.truncate(limit);
        }
        Ok(members)
    }

    async fn apply(&self, batch: Batch) -> Result<()> {
        let mut map = self.inner.lock().unwrap();
        for op in &batch.ops {
            apply_op(&mut map, op);
        }
        Ok(())
    }
}

/// Scriptable provider double. Failure knobs cover the retry paths: a number
/// of transient failures before success, per-show permanent failures, and a
/// failing changed-shows poll.
#[derive(Default)]
pub(crate) struct StubSource {
    full_shows: Mutex<HashMap<String, FullShow>>,
    posters: Mutex<HashMap<String, Vec<PosterCandidate>>>,
    images: Mutex<HashMap<String, Vec<u8>>>,
    changed: Mutex<Option<ChangedShows>>,
    fail_ids: Mutex<HashSet<String>>,
    transient_failures: AtomicU32,
    changed_poll_fails: AtomicBool,
    fetch_calls: AtomicU32,
}

impl StubSource {
    pub(crate) fn add_full_show(&self, full: FullShow) {
        self.full_shows.lock().unwrap().insert(full.show.id.clone(), full);
    }

    pub(crate) fn add_posters(&self, show_id: &str, candidates: Vec<PosterCandidate>) {
        self.posters.lock().unwrap().insert(show_id.to_string(), candidates);
    }

    pub(crate) fn add_image(&self, image_ref: &str, bytes: Vec<u8>) {
        self.images.lock().unwrap().insert(image_ref.to_string(), bytes);
    }

    pub(crate) fn set_changed(&self, show_ids: Vec<&str>, watermark: i64) {
        *self.changed.lock().unwrap() = Some(ChangedShows {
            show_ids: show_ids.into_iter().map(String::from).collect(),
            watermark,
        });
    }

    pub(crate) fn fail_next_fetches(&self, count: u32) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    pub(crate) fn always_fail_show(&self, show_id: &str) {
        self.fail_ids.lock().unwrap().insert(show_id.to_string());
    }

    pub(crate) fn fail_changed_poll(&self) {
        self.changed_poll_fails.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShowMetadataSource for StubSource {
    async fn search(&self, _query: &str) -> std::result::Result<Vec<SearchResult>, SourceError> {
        Ok(Vec::new())
    }

    async fn fetch_full_show(&self, show_id: &str) -> std::result::Result<FullShow, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.transient_failures.load(Ordering::SeqCst) > 0 {
            self.transient_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(SourceError::Status { status: 503 });
        }

        if self.fail_ids.lock().unwrap().contains(show_id) {
            return Err(SourceError::Status { status: 500 });
        }

        self.full_shows
            .lock()
            .unwrap()
            .get(show_id)
            .cloned()
            .ok_or(SourceError::NotFound)
    }

    async fn fetch_changed_shows(
        &self,
        since: Option<i64>,
    ) -> std::result::Result<ChangedShows, SourceError> {
        if self.changed_poll_fails.load(Ordering::SeqCst) {
            return Err(SourceError::Status { status: 503 });
        }

        Ok(self.changed.lock().unwrap().clone().unwrap_or(ChangedShows {
            show_ids: Vec::new(),
            watermark: since.unwrap_or(0),
        }))
    }

    async fn fetch_poster_candidates(
        &self,
        show_id: &str,
    ) -> std::result::Result<Vec<PosterCandidate>, SourceError> {
        Ok(self.posters.lock().unwrap().get(show_id).cloned().unwrap_or_default())
    }

    async fn fetch_image(&self, image_ref: &str) -> std::result::Result<Vec<u8>, SourceError> {
        self.images.lock().unwrap().get(image_ref).cloned().ok_or(SourceError::NotFound)
    }
}

pub(crate) fn episode(season: u16, number: u16, air_date: &str) -> Episode {
    Episode {
        id: EpisodeId::new(season, number),
        title: format!("Episode {season}x{number:02}"),
        air_date: air_date.parse().unwrap(),
    }
}

/// `ended` marks the show terminal upstream; the air date itself is left for
/// the store to derive from the episode list.
pub(crate) fn full_show(id: &str, name: &str, episodes: Vec<Episode>, ended: bool) -> FullShow {
    let seasons = episodes.iter().map(|e| e.season()).collect::<BTreeSet<_>>().len() as u32;

    FullShow {
        show: Show {
            id: id.to_string(),
            name: name.to_string(),
            status: if ended { ShowStatus::Ended } else { ShowStatus::Returning },
            country: Some("US".to_string()),
            network: Some("HBO".to_string()),
            seasons,
            first_aired: None,
            last_aired: ended.then_some(AirDate::UNKNOWN),
        },
        episodes,
    }
}

pub(crate) struct StoreFixture {
    pub kv: Arc<MemoryKv>,
    pub source: Arc<StubSource>,
    pub store: ShowStore,
    #[allow(dead_code)]
    pub posters_dir: PathBuf,
    _tmp: TempDir,
}

pub(crate) fn store_fixture() -> StoreFixture {
    let tmp = TempDir::new().unwrap();
    let posters_dir = tmp.path().join("posters");
    let kv: Arc<MemoryKv> = Arc::new(MemoryKv::default());
    let source = Arc::new(StubSource::default());
    let posters =
        PosterCache::new(&posters_dir, source.clone(), RetryPolicy::immediate(4)).unwrap();
    let store =
        ShowStore::new(kv.clone(), source.clone(), posters, RetryPolicy::immediate(4));

    StoreFixture { kv, source, store, posters_dir, _tmp: tmp }
}

pub(crate) struct LibraryFixture {
    pub kv: Arc<MemoryKv>,
    pub source: Arc<StubSource>,
    pub library: UserLibrary,
    pub posters_dir: PathBuf,
    _tmp: TempDir,
}

pub(crate) fn library_fixture() -> LibraryFixture {
    let tmp = TempDir::new().unwrap();
    let posters_dir = tmp.path().join("posters");
    let kv: Arc<MemoryKv> = Arc::new(MemoryKv::default());
    let source = Arc::new(StubSource::default());
    let posters =
        PosterCache::new(&posters_dir, source.clone(), RetryPolicy::immediate(4)).unwrap();
    let store = Arc::new(ShowStore::new(
        kv.clone(),
        source.clone(),
        posters.clone(),
        RetryPolicy::immediate(4),
    ));
    let library = UserLibrary::new(kv.clone(), store, posters);

    LibraryFixture { kv, source, library, posters_dir, _tmp: tmp }
}

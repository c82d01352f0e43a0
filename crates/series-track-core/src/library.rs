use crate::error::{Result, StoreError};
use crate::keys::{self, user_fields};
use crate::kv::{Batch, Kv, ScoreBound};
use crate::posters::PosterCache;
use crate::store::ShowStore;
use rand::RngCore;
use series_track_models::{EpisodeId, UserSettings};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

/// Usernames are case-insensitive; the lowercased form is the identity.
pub(crate) fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn new_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Per-user state: credentials, the ordered subscription list, watch markers,
/// and sparse settings. Shares the show records through [`ShowStore`].
pub struct UserLibrary {
    kv: Arc<dyn Kv>,
    store: Arc<ShowStore>,
    posters: PosterCache,
}

impl UserLibrary {
    pub fn new(kv: Arc<dyn Kv>, store: Arc<ShowStore>, posters: PosterCache) -> Self {
        Self { kv, store, posters }
    }

    pub fn store(&self) -> &ShowStore {
        &self.store
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        let username = normalize_username(username);
        self.kv.exists(&keys::user(&username)).await
    }

    /// Create the user with a fresh salt. Only the salted hash is ever
    /// stored.
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        let username = normalize_username(username);
        if self.kv.exists(&keys::user(&username)).await? {
            return Err(StoreError::AlreadyExists);
        }

        let salt = new_salt();
        let hashed = hash_password(&salt, password);

        let key = keys::user(&username);
        let mut batch = Batch::new();
        batch.hset(&key, user_fields::SALT, &salt);
        batch.hset(&key, user_fields::PASSWORD, &hashed);
        self.kv.apply(batch).await?;

        info!(username, "registered user");
        Ok(())
    }

    /// Constant-time credential check. A wrong password or unknown user is
    /// `Ok(false)`; only storage trouble is an error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        let username = normalize_username(username);
        let key = keys::user(&username);

        let (salt, stored) = match (
            self.kv.hget(&key, user_fields::SALT).await?,
            self.kv.hget(&key, user_fields::PASSWORD).await?,
        ) {
            (Some(salt), Some(stored)) => (salt, stored),
            _ => return Ok(false),
        };

        let computed = hash_password(&salt, password);
        Ok(constant_time_eq::constant_time_eq(computed.as_bytes(), stored.as_bytes()))
    }

    /// Subscribe the user to a show, pulling it from the provider on first
    /// local sight. Without an explicit order the show sorts before
    /// everything the user already has. Re-subscribing only updates the
    /// order; the reference count moves on the first subscription alone.
    pub async fn subscribe(&self, username: &str, show_id: &str, order: Option<f64>) -> Result<()> {
        let username = normalize_username(username);

        if !self.store.exists(show_id).await? {
            self.store.ingest_show(show_id).await?;
        }

        let shows_key = keys::user_shows(&username);
        let order = match order {
            Some(order) => order,
            None => self
                .kv
                .zmin_score(&shows_key)
                .await?
                .map(|min| min - 1.0)
                .unwrap_or(0.0),
        };

        let newly_added = self.kv.zadd(&shows_key, order, show_id).await?;
        if newly_added {
            self.store.increment_ref(show_id).await?;
            info!(username, show_id, "subscribed");
        }

        Ok(())
    }

    /// Drop the subscription: watch marker and custom poster go with it, and
    /// the shared record is released.
    pub async fn unsubscribe(&self, username: &str, show_id: &str) -> Result<()> {
        let username = normalize_username(username);

        self.kv.hdel(&keys::user_last_seen(&username), show_id).await?;
        self.posters.delete_custom(&username, show_id)?;

        let removed = self.kv.zrem(&keys::user_shows(&username), show_id).await?;
        if removed {
            self.store.decrement_ref(show_id).await?;
            info!(username, show_id, "unsubscribed");
        }

        Ok(())
    }

    pub async fn show_list(&self, username: &str) -> Result<Vec<String>> {
        let username = normalize_username(username);
        self.kv
            .zrange_by_score(&keys::user_shows(&username), ScoreBound::NegInf, ScoreBound::PosInf, None)
            .await
    }

    pub async fn has_show(&self, username: &str, show_id: &str) -> Result<bool> {
        let username = normalize_username(username);
        Ok(self.kv.zscore(&keys::user_shows(&username), show_id).await?.is_some())
    }

    /// Move the watch marker. The episode must exist in the show's index;
    /// otherwise the previously stored marker stays untouched. `None` clears
    /// the marker, making everything unseen again.
    pub async fn set_watch_marker(
        &self,
        username: &str,
        show_id: &str,
        marker: Option<EpisodeId>,
    ) -> Result<()> {
        let username = normalize_username(username);
        let key = keys::user_last_seen(&username);

        match marker {
            Some(episode) => {
                if !self.store.has_episode(show_id, episode).await? {
                    return Err(StoreError::InvalidEpisode);
                }
                self.kv.hset(&key, show_id, &episode.to_string()).await
            }
            None => {
                self.kv.hdel(&key, show_id).await?;
                Ok(())
            }
        }
    }

    /// Bulk manual reordering. Every show id is validated against the user's
    /// subscriptions before a single write happens; one bad id rejects the
    /// whole request.
    pub async fn reorder(&self, username: &str, orders: &[(String, f64)]) -> Result<()> {
        let username = normalize_username(username);
        let shows_key = keys::user_shows(&username);

        let members: Vec<String> = orders.iter().map(|(id, _)| id.clone()).collect();
        let scores = self.kv.zscores(&shows_key, &members).await?;
        for (member, score) in members.iter().zip(&scores) {
            if score.is_none() {
                return Err(StoreError::InvalidShow(member.clone()));
            }
        }

        let mut batch = Batch::new();
        for (show_id, order) in orders {
            batch.zadd(&shows_key, *order, show_id);
        }
        self.kv.apply(batch).await
    }

    /// Settings with sparse storage: only fields that differ from the
    /// defaults exist in the hash.
    pub async fn settings(&self, username: &str) -> Result<UserSettings> {
        let username = normalize_username(username);
        let key = keys::user(&username);
        let defaults = UserSettings::default();

        let language = self
            .kv
            .hget(&key, user_fields::LANGUAGE)
            .await?
            .unwrap_or(defaults.language);

        let episodes_per_show = match self.kv.hget(&key, user_fields::EPISODES_PER_SHOW).await? {
            Some(raw) => raw
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("episodes_per_show: {e}")))?,
            None => defaults.episodes_per_show,
        };

        Ok(UserSettings { language, episodes_per_show })
    }

    pub async fn update_settings(&self, username: &str, settings: &UserSettings) -> Result<()> {
        let username = normalize_username(username);
        let key = keys::user(&username);

        let mut batch = Batch::new();
        if settings.language_is_default() {
            batch.hdel(&key, user_fields::LANGUAGE);
        } else {
            batch.hset(&key, user_fields::LANGUAGE, &settings.language);
        }
        if settings.episodes_per_show_is_default() {
            batch.hdel(&key, user_fields::EPISODES_PER_SHOW);
        } else {
            batch.hset(&key, user_fields::EPISODES_PER_SHOW, &settings.episodes_per_show.to_string());
        }
        self.kv.apply(batch).await
    }
}

//! Key layout of the store. Internal only; nothing outside this crate may
//! depend on these shapes.

/// Hash of show id -> subscriber reference count. A field exists here iff the
/// show record exists.
pub(crate) const SHOW_REFCOUNTS: &str = "shows";

/// Hash carrying sweep bookkeeping (currently just the watermark field).
pub(crate) const UPDATES: &str = "updates";

pub(crate) fn show(show_id: &str) -> String {
    format!("show:{show_id}")
}

pub(crate) fn show_episodes(show_id: &str) -> String {
    format!("show:{show_id}:episodes")
}

pub(crate) fn user(username: &str) -> String {
    format!("user:{username}")
}

pub(crate) fn user_shows(username: &str) -> String {
    format!("user:{username}:shows")
}

pub(crate) fn user_last_seen(username: &str) -> String {
    format!("user:{username}:lastseen")
}

pub(crate) mod show_fields {
    pub(crate) const NAME: &str = "name";
    pub(crate) const STATUS: &str = "status";
    pub(crate) const COUNTRY: &str = "country";
    pub(crate) const NETWORK: &str = "network";
    pub(crate) const SEASONS: &str = "seasons";
    pub(crate) const FIRST_AIRED: &str = "firstaired";
    pub(crate) const LAST_AIRED: &str = "lastaired";
}

pub(crate) mod user_fields {
    pub(crate) const SALT: &str = "salt";
    pub(crate) const PASSWORD: &str = "password";
    pub(crate) const LANGUAGE: &str = "language";
    pub(crate) const EPISODES_PER_SHOW: &str = "episodes_per_show";
}

pub(crate) mod update_fields {
    pub(crate) const WATERMARK: &str = "watermark";
}

use series_track_sources::SourceError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store-level failure taxonomy.
///
/// Validation errors (`AlreadyExists`, `InvalidEpisode`, `InvalidShow`) are
/// raised before any write happens, so they always leave stored state
/// untouched. `UpstreamUnavailable` means the retry policy against the
/// metadata provider was exhausted. `Storage`/`Io`/`Corrupt` abort the
/// current operation and surface to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record does not exist")]
    NotFound,

    #[error("user already exists")]
    AlreadyExists,

    #[error("show has no such episode")]
    InvalidEpisode,

    #[error("user is not subscribed to show {0}")]
    InvalidShow(String),

    #[error("metadata provider unavailable: {0}")]
    UpstreamUnavailable(#[source] SourceError),

    #[error("key-value store error: {0}")]
    Storage(#[from] redis::RedisError),

    #[error("poster file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record in store: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Classify a provider failure: an upstream "no such show" is a plain
    /// `NotFound` to our callers; everything else means the provider could
    /// not be talked to usefully.
    pub(crate) fn upstream(e: SourceError) -> Self {
        match e {
            SourceError::NotFound => StoreError::NotFound,
            other => StoreError::UpstreamUnavailable(other),
        }
    }
}

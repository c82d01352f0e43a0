use color_eyre::eyre::eyre;
use color_eyre::Result;
use series_track_config::{Config, PathManager};
use series_track_core::{Kv, PosterCache, RedisKv, ShowStore, UserLibrary};
use series_track_sources::{RetryPolicy, ShowMetadataSource, TvMazeClient};
use std::sync::Arc;

/// Everything a subcommand needs, wired together from the config file.
pub struct AppContext {
    pub config: Config,
    pub library: UserLibrary,
}

impl AppContext {
    pub fn store(&self) -> &ShowStore {
        self.library.store()
    }
}

pub async fn build_context() -> Result<AppContext> {
    let paths = PathManager::default();
    paths.ensure_directories().map_err(|e| eyre!("{e}"))?;

    let config = Config::load_or_default(&paths.config_file()).map_err(|e| eyre!("{e}"))?;
    config.validate().map_err(|e| eyre!("{e}"))?;

    let kv: Arc<dyn Kv> = Arc::new(RedisKv::connect(&config.redis.url).await?);
    let source: Arc<dyn ShowMetadataSource> =
        Arc::new(TvMazeClient::new(config.provider.base_url.as_str())?);

    let posters_dir = config.posters.dir.clone().unwrap_or_else(|| paths.posters_dir());
    let posters = PosterCache::new(posters_dir, source.clone(), RetryPolicy::default())?;

    let store = Arc::new(ShowStore::new(
        kv.clone(),
        source,
        posters.clone(),
        RetryPolicy::default(),
    ));
    let library = UserLibrary::new(kv, store, posters);

    Ok(AppContext { config, library })
}

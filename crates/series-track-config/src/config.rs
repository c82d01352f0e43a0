use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub posters: PostersConfig,
    #[serde(default)]
    pub update: UpdateConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self { url: default_redis_url() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { base_url: default_provider_base_url() }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PostersConfig {
    /// Overrides the poster directory under the data dir when set.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Pause between re-ingested shows during a sweep, to stay friendly with
    /// the provider's rate limits.
    #[serde(default = "default_inter_show_delay_ms")]
    pub inter_show_delay_ms: u64,
    /// How often the daemon runs the sweep.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            inter_show_delay_ms: default_inter_show_delay_ms(),
            interval_hours: default_interval_hours(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_provider_base_url() -> String {
    "https://api.tvmaze.com".to_string()
}

fn default_inter_show_delay_ms() -> u64 {
    1000
}

fn default_interval_hours() -> u64 {
    24
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file when present, falling back to defaults otherwise.
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.redis.url.starts_with("redis://") && !self.redis.url.starts_with("rediss://") {
            return Err(anyhow::anyhow!(
                "redis.url must be a redis:// or rediss:// URL, got {}",
                self.redis.url
            ));
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "provider.base_url must be an http(s) URL, got {}",
                self.provider.base_url
            ));
        }

        if self.update.interval_hours == 0 {
            return Err(anyhow::anyhow!("update.interval_hours must be at least 1"));
        }

        Ok(())
    }
}

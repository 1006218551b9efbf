use crate::core::schedule::{
    CACHE_DURATION_HOURS, MIN_REFRESH_INTERVAL_MINUTES, ScheduledRefresh, UPDATE_HOURS,
};
use anyhow::{Context, Result, anyhow};
use chrono::{Duration, FixedOffset};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const PRIMARY_BASE_URL: &str = "https://api.exchangerate.host";
pub const BACKEND_BASE_URL: &str = "http://localhost:8000/api";
pub const PERSISTED_MAX_AGE_HOURS: i64 = 12;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "default_primary")]
    pub primary: ProviderConfig,
    #[serde(default = "default_backend")]
    pub backend: ProviderConfig,
}

fn default_primary() -> ProviderConfig {
    ProviderConfig {
        base_url: PRIMARY_BASE_URL.to_string(),
    }
}

fn default_backend() -> ProviderConfig {
    ProviderConfig {
        base_url: BACKEND_BASE_URL.to_string(),
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            primary: default_primary(),
            backend: default_backend(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 10,
            retries: 1,
            retry_delay_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub duration_hours: i64,
    pub persisted_max_age_hours: i64,
    pub update_hours: Vec<u32>,
    pub min_refresh_interval_minutes: i64,
    /// Offset the update hours are read in; the host's local offset when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            duration_hours: CACHE_DURATION_HOURS,
            persisted_max_age_hours: PERSISTED_MAX_AGE_HOURS,
            update_hours: UPDATE_HOURS.to_vec(),
            min_refresh_interval_minutes: MIN_REFRESH_INTERVAL_MINUTES,
            utc_offset_minutes: None,
        }
    }
}

impl CacheConfig {
    pub fn cache_duration(&self) -> Duration {
        Duration::hours(self.duration_hours)
    }

    pub fn persisted_max_age(&self) -> Duration {
        Duration::hours(self.persisted_max_age_hours)
    }

    pub fn refresh_policy(&self) -> Result<ScheduledRefresh> {
        if let Some(hour) = self.update_hours.iter().find(|h| **h > 23) {
            return Err(anyhow!("Invalid update hour in config: {hour}"));
        }
        let mut policy = ScheduledRefresh {
            cache_duration: self.cache_duration(),
            min_interval: Duration::minutes(self.min_refresh_interval_minutes),
            update_hours: self.update_hours.clone(),
            ..ScheduledRefresh::default()
        };
        if let Some(minutes) = self.utc_offset_minutes {
            policy.offset = FixedOffset::east_opt(minutes * 60)
                .ok_or_else(|| anyhow!("Invalid UTC offset in config: {minutes} minutes"))?;
        }
        Ok(policy)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the config from the default location, or defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "b2bmarket", "fxrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "b2bmarket", "fxrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

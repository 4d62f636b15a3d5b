use crate::core::quota::DEFAULT_MAX_QUOTA;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "PROPVAL_API_KEY";
pub const DEFAULT_RENTCAST_URL: &str = "https://api.rentcast.io/v1";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// JSON document on disk
    #[default]
    File,
    /// Embedded fjall keyspace
    Kv,
    /// Process memory, lost on exit
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QuotaConfig {
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,
    #[serde(default)]
    pub storage: StorageKind,
    /// File or keyspace location. Defaults to the data directory.
    pub path: Option<String>,
    /// Identifies the counter inside a shared store.
    #[serde(default = "default_quota_key")]
    pub key: String,
}

fn default_max_calls() -> u32 {
    DEFAULT_MAX_QUOTA
}

fn default_quota_key() -> String {
    "rentcast".to_string()
}

impl Default for QuotaConfig {
    fn default() -> Self {
        QuotaConfig {
            max_calls: default_max_calls(),
            storage: StorageKind::default(),
            path: None,
            key: default_quota_key(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RentcastProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub rentcast: Option<RentcastProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            rentcast: Some(RentcastProviderConfig {
                base_url: DEFAULT_RENTCAST_URL.to_string(),
                api_key: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
            .context("No usable configuration, run `propval setup` to create one")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "propval", "propval")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "propval", "propval")
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

    /// Where the quota counter lives for file and kv storage.
    pub fn quota_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.quota.path {
            return Ok(PathBuf::from(path));
        }
        let data_dir = self.default_data_path()?;
        Ok(match self.quota.storage {
            StorageKind::Kv => data_dir.join("quota"),
            StorageKind::File | StorageKind::Memory => data_dir.join("pull_counter.json"),
        })
    }

    pub fn rentcast(&self) -> RentcastProviderConfig {
        self.providers
            .rentcast
            .clone()
            .unwrap_or_else(|| RentcastProviderConfig {
                base_url: DEFAULT_RENTCAST_URL.to_string(),
                api_key: None,
            })
    }

    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.rentcast().api_key)
            .filter(|k| !k.trim().is_empty())
    }
}

//! Layered configuration: defaults, optional TOML file, then `IPFS_RENT_*` env vars.

use anyhow::{anyhow, Context, Result};
use config::{Config, File as ConfigFile};
use ipfs_rent_registry::{AccessCounting, RegistryConfig};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "ipfs-rent.toml";
pub const DEFAULT_DATA_DIR: &str = "./data/ipfs-rent";
pub const ENV_PREFIX: &str = "IPFS_RENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sled,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "sled" => Ok(StoreBackend::Sled),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!(
                "unknown backend '{other}' (expected 'sled' or 'memory')"
            )),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            StoreBackend::Sled => "sled",
            StoreBackend::Memory => "memory",
        };
        f.write_str(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(anyhow!(
                "unknown log format '{other}' (expected 'pretty' or 'compact')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub backend: StoreBackend,
    pub access_counting: AccessCounting,
    pub log_level: String,
    pub log_format: LogFormat,
    pub default_actor: Option<String>,
}

impl AppConfig {
    /// Load configuration from `path_override` (must exist) or `ipfs-rent.toml`
    /// in the working directory (if present), overlaid by `IPFS_RENT_*` env vars.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let resolved_path = match path_override {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path.to_path_buf())
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                path.exists().then_some(path)
            }
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        let config = builder
            .build()
            .context("failed to assemble configuration")?;
        Self::from_config(&config)
    }

    /// Interpret an already-built configuration, applying defaults for missing keys.
    pub fn from_config(config: &Config) -> Result<Self> {
        let data_dir = get_string_value(config, "data_dir")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let backend = get_string_value(config, "backend")
            .map(|value| value.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or(StoreBackend::Sled);

        let access_counting = get_string_value(config, "access_counting")
            .map(|value| value.parse::<AccessCounting>().map_err(|e| anyhow!(e)))
            .transpose()?
            .unwrap_or_default();

        let log_level =
            get_string_value(config, "log_level").unwrap_or_else(|| "info".to_string());

        let log_format = get_string_value(config, "log_format")
            .map(|value| value.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Pretty);

        let default_actor = get_string_value(config, "default_actor");

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            backend,
            access_counting,
            log_level,
            log_format,
            default_actor,
        })
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default().with_access_counting(self.access_counting)
    }
}

fn get_string_value(config: &Config, key: &str) -> Option<String> {
    config
        .get_string(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

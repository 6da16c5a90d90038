use anyhow::{Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use image_annotations_core::persist::STORAGE_KEY;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    STORAGE_KEY.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_max_concurrent_reads")]
    pub max_concurrent_reads: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            max_concurrent_reads: default_max_concurrent_reads(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    [
        "png", "jpg", "jpeg", "gif", "webp", "bmp", "svg", "tif", "tiff", "ico", "avif",
    ]
    .iter()
    .map(|ext| format!("**/*.{}", ext))
    .collect()
}

fn default_max_concurrent_reads() -> usize {
    8
}

impl Config {
    /// Built-in configuration used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            storage: StorageConfig {
                path: PathBuf::from("./data/annotations.sqlite"),
                key: default_key(),
            },
            upload: UploadConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but falls back to [`Config::minimal`] when `path`
/// does not exist. A file that exists but is invalid is still an error.
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        log::debug!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.storage.key.trim().is_empty() {
        anyhow::bail!("storage.key must not be empty");
    }

    if config.upload.max_concurrent_reads == 0 {
        anyhow::bail!("upload.max_concurrent_reads must be >= 1");
    }

    for pattern in config
        .upload
        .include_globs
        .iter()
        .chain(config.upload.exclude_globs.iter())
    {
        Glob::new(pattern).with_context(|| format!("Invalid upload glob: '{}'", pattern))?;
    }

    Ok(())
}

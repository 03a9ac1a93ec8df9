use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use catalog::MediaRoot;
use common::MediaTypes;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDirConfig {
    pub path: String,
    /// Any of `A`, `V`, `P`; empty means all three.
    pub types: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub version: u32,
    pub index_path: String,
    pub media_dirs: Vec<MediaDirConfig>,
    pub merge_media_dirs: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            index_path: "catalog.redb".to_string(),
            media_dirs: Vec::new(),
            merge_media_dirs: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("CATALOG_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

pub fn load_or_create_config(path: &Path) -> Result<(ScanConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ScanConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.index_path.trim().is_empty() {
            config.index_path = "catalog.redb".to_string();
        }
        config
            .media_dirs
            .retain(|dir| !dir.path.trim().is_empty());
        return Ok((config, false));
    }

    let config = ScanConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ScanConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

/// Configured media directories as roots, paths resolved against the config
/// file. Entries with unknown type flags are dropped with a warning.
pub fn media_roots(config_path: &Path, config: &ScanConfig) -> Vec<MediaRoot> {
    let mut roots = Vec::new();
    for dir in &config.media_dirs {
        match MediaTypes::parse(&dir.types) {
            Some(types) => roots.push(MediaRoot {
                path: resolve_path(config_path, dir.path.trim()),
                types,
            }),
            None => warn!("Ignoring media dir {:?}: bad types {:?}", dir.path, dir.types),
        }
    }
    roots
}

/// Parses a `[TYPES,]PATH` argument. A prefix that is not a valid set of type
/// flags is taken as part of the path.
pub fn parse_media_arg(value: &str) -> Option<MediaRoot> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some((flags, path)) = value.split_once(',') {
        if !flags.is_empty() && !path.is_empty() {
            if let Some(types) = MediaTypes::parse(flags) {
                return Some(MediaRoot {
                    path: PathBuf::from(path),
                    types,
                });
            }
        }
    }
    Some(MediaRoot {
        path: PathBuf::from(value),
        types: MediaTypes::ALL,
    })
}

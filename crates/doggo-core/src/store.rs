//! Per-user configuration persistence.
//!
//! A [`ConfigStore`] is a handle on one configuration directory (by default
//! `~/.doggo`) holding a single pretty-printed `config.json`. There is no
//! locking: concurrent writers race and the last save wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::ConfigSource;
use crate::types::{ConfigRecord, ConfigSummary, CONFIG_VERSION};

pub const CONFIG_DIR_NAME: &str = ".doggo";
pub const CONFIG_FILE_NAME: &str = "config.json";

const API_KEY_PREFIX: &str = "sk-";
const API_KEY_MIN_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `<home>/.doggo`. Falls back to `./.doggo` when the
    /// home directory cannot be determined.
    pub fn from_home() -> Self {
        Self::new(Self::default_dir())
    }

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(CONFIG_DIR_NAME)
    }

    pub fn get_config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn get_config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn create_config_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))
    }

    pub fn default_config() -> ConfigRecord {
        ConfigRecord {
            openai_api_key: String::new(),
            indexed_paths: Vec::new(),
            last_reindex: None,
            version: Some(CONFIG_VERSION.to_string()),
            extra: serde_json::Map::new(),
        }
    }

    /// Reads the config file, or returns [`Self::default_config`] when it does
    /// not exist. Never creates the file.
    pub fn load_config(&self) -> Result<ConfigRecord> {
        let path = self.get_config_file();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file missing, using defaults");
                return Ok(Self::default_config());
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        serde_json::from_str(&content).map_err(|source| Error::Parse { path, source })
    }

    pub fn save_config(&self, config: &ConfigRecord) -> Result<()> {
        let path = self.get_config_file();
        let body = serde_json::to_string_pretty(config)
            .map_err(|source| Error::Parse { path: path.clone(), source })?;
        fs::write(&path, body).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn create_default_config(&self) -> Result<()> {
        if self.get_config_file().exists() {
            return Ok(());
        }
        self.save_config(&Self::default_config())
    }

    pub fn initialize(&self) -> Result<()> {
        self.create_config_dir()?;
        self.create_default_config()
    }

    /// Syntactic check only; no network call.
    pub fn validate_api_key(key: &str) -> bool {
        key.starts_with(API_KEY_PREFIX) && key.chars().count() > API_KEY_MIN_LEN
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        if !Self::validate_api_key(key) {
            return Err(Error::Validation("Invalid OpenAI API key format.".into()));
        }
        let mut config = self.load_config()?;
        config.openai_api_key = key.to_string();
        self.save_config(&config)
    }

    /// Records a path as indexed. Paths already present are not duplicated.
    pub fn add_indexed_path(&self, path: &str) -> Result<()> {
        let mut config = self.load_config()?;
        if config.indexed_paths.iter().any(|p| p == path) {
            return Ok(());
        }
        config.indexed_paths.push(path.to_string());
        self.save_config(&config)
    }

    /// Stamps `last_reindex` with the current UTC time (RFC 3339).
    pub fn mark_reindexed(&self) -> Result<()> {
        let mut config = self.load_config()?;
        config.last_reindex = Some(chrono::Utc::now().to_rfc3339());
        self.save_config(&config)
    }

    pub fn summary(&self) -> Result<ConfigSummary> {
        let config = self.load_config()?;
        let api_key = if config.has_api_key() {
            mask_api_key(&config.openai_api_key)
        } else {
            "(not set)".to_string()
        };
        Ok(ConfigSummary {
            api_key,
            indexed_paths: config.indexed_paths.len(),
            last_reindex: config.last_reindex.filter(|s| !s.is_empty()).unwrap_or_else(|| "Never".to_string()),
            version: config.version.unwrap_or_else(|| "?".to_string()),
        })
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::from_home()
    }
}

impl ConfigSource for ConfigStore {
    fn load_config(&self) -> Result<ConfigRecord> {
        ConfigStore::load_config(self)
    }
}

/// `first6 + "..." + last4`, counted in characters. Keys shorter than ten
/// characters produce overlapping slices.
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}...{tail}")
}

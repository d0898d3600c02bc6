//! Runtime settings loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `doggo.toml` + `DOGGO_*` env vars.
//! These settings say *where* things live and *which* provider to talk to; the
//! user's API key and indexing history live in the JSON record managed by
//! [`crate::store::ConfigStore`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::ConfigStore;

pub const SETTINGS_FILE: &str = "doggo.toml";
pub const ENV_PREFIX: &str = "DOGGO_";

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_COLLECTION: &str = "images";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Overrides `~/.doggo`. `~` and `$VAR` are expanded.
    pub config_dir: Option<String>,
    /// LanceDB directory; relative paths resolve against the config dir.
    pub db_dir: Option<String>,
    pub collection: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub api_base: String,
    pub request_timeout_secs: Option<u64>,
    pub use_fake_embeddings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: None,
            db_dir: None,
            collection: DEFAULT_COLLECTION.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: None,
            use_fake_embeddings: false,
        }
    }
}

impl Settings {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(SETTINGS_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))
    }

    pub fn config_dir(&self) -> PathBuf {
        match &self.config_dir {
            Some(dir) => expand_path(dir),
            None => ConfigStore::default_dir(),
        }
    }

    pub fn db_dir(&self) -> PathBuf {
        let base = self.config_dir();
        match &self.db_dir {
            Some(dir) => resolve_with_base(&base, dir),
            None => base.join("db"),
        }
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.config_dir())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

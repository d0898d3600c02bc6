//! Domain types shared by the config store, the search path and the index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form per-image metadata as stored next to each embedding.
///
/// The search path expects `file_path`, `file_name` and `file_size`, but any
/// key may be present.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

pub const CONFIG_VERSION: &str = "0.1.0";

/// The persisted configuration record (`config.json`).
///
/// Every field falls back to its default when absent. Keys this crate does
/// not know about are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub indexed_paths: Vec<String>,
    #[serde(default)]
    pub last_reindex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConfigRecord {
    pub fn has_api_key(&self) -> bool {
        !self.openai_api_key.is_empty()
    }
}

/// Display-oriented view of a [`ConfigRecord`] with the API key masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    pub api_key: String,
    pub indexed_paths: usize,
    pub last_reindex: String,
    pub version: String,
}

impl fmt::Display for ConfigSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OpenAI API Key: {}", self.api_key)?;
        writeln!(f, "Indexed Paths: {}", self.indexed_paths)?;
        writeln!(f, "Last Reindex: {}", self.last_reindex)?;
        write!(f, "Version: {}", self.version)
    }
}

/// One ranked hit returned by a similarity search.
///
/// `similarity_score` is `1 - distance` as reported by the index. It is a
/// relative ranking value, not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub description: String,
    pub metadata: Metadata,
    pub similarity_score: f32,
}

/// Optional columns a vector query should return alongside ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    pub documents: bool,
    pub metadatas: bool,
    pub distances: bool,
}

impl Include {
    pub fn all() -> Self {
        Self { documents: true, metadatas: true, distances: true }
    }
}

/// Raw nearest-neighbour response in single-query batch shape.
///
/// Each field holds one inner list per query embedding. Columns that were not
/// requested through [`Include`] are left empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<Metadata>>,
    pub distances: Vec<Vec<f32>>,
}

/// A row written into the image index by indexing code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub description: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub vector: Vec<f32>,
}

impl ImageRecord {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("file_path".into(), self.file_path.clone().into());
        meta.insert("file_name".into(), self.file_name.clone().into());
        meta.insert("file_size".into(), self.file_size.into());
        meta
    }
}

use crate::error::Result;
use crate::types::{ConfigRecord, Include, QueryResponse};

/// Turns text into an embedding vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, api_key: &str, model: &str, text: &str) -> Result<Vec<f32>>;
}

/// Nearest-neighbour lookup over stored image embeddings.
pub trait VectorIndex: Send + Sync {
    fn query(&self, embedding: &[f32], n_results: usize, include: Include) -> Result<QueryResponse>;
}

/// Anything that can produce the current configuration record.
pub trait ConfigSource {
    fn load_config(&self) -> Result<ConfigRecord>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn load_config(&self) -> Result<ConfigRecord> {
        (**self).load_config()
    }
}

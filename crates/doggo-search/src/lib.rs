use doggo_core::config::DEFAULT_EMBEDDING_MODEL;
use doggo_core::error::{Error, Result};
use doggo_core::traits::{ConfigSource, Embedder, VectorIndex};
use doggo_core::types::{Include, QueryResponse, SearchResult};
use tracing::debug;

mod preview;

pub use preview::{format_file_size, format_preview};

pub const DEFAULT_LIMIT: usize = 10;

/// Rejects a blank query or a zero limit without touching config or providers.
pub fn validate_request(query: &str, limit: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::Validation("Search query cannot be empty".into()));
    }
    if limit == 0 {
        return Err(Error::Validation("Limit must be positive".into()));
    }
    Ok(())
}

/// Query text in, ranked images out.
///
/// The config source is consulted on every call, so an API key set between
/// two searches is picked up without rebuilding the searcher.
pub struct Searcher<C, V> where C: ConfigSource, V: VectorIndex {
    config: C,
    index: V,
    embedder: Box<dyn Embedder>,
    model: String,
}

impl<C, V> Searcher<C, V> where C: ConfigSource, V: VectorIndex {
    pub fn new(config: C, index: V, embedder: Box<dyn Embedder>) -> Self {
        Self { config, index, embedder, model: DEFAULT_EMBEDDING_MODEL.to_string() }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generate_query_embedding(&self, query: &str) -> Result<Vec<f32>> {
        let config = self.config.load_config()?;
        if !config.has_api_key() {
            return Err(Error::Config("OpenAI API key not configured".into()));
        }
        self.embedder.embed(&config.openai_api_key, &self.model, query)
    }

    /// Results keep the index's order; nothing is re-sorted here.
    pub fn search_similar_images(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        validate_request(query, limit)?;
        let embedding = self.generate_query_embedding(query)?;
        let response = self.index.query(&embedding, limit, Include::all())?;
        let results = into_results(response)?;
        debug!(query, limit, hits = results.len(), "search complete");
        Ok(results)
    }
}

/// Flattens the first result set of a single-query batch response.
fn into_results(response: QueryResponse) -> Result<Vec<SearchResult>> {
    let QueryResponse { ids, documents, metadatas, distances } = response;
    let Some(ids) = ids.into_iter().next() else {
        return Ok(Vec::new());
    };
    let documents = documents.into_iter().next().unwrap_or_default();
    let metadatas = metadatas.into_iter().next().unwrap_or_default();
    let distances = distances.into_iter().next().unwrap_or_default();
    if documents.len() != ids.len() || metadatas.len() != ids.len() || distances.len() != ids.len() {
        return Err(Error::Provider(format!(
            "index returned mismatched columns: {} ids, {} documents, {} metadatas, {} distances",
            ids.len(),
            documents.len(),
            metadatas.len(),
            distances.len()
        )));
    }
    Ok(ids
        .into_iter()
        .zip(documents)
        .zip(metadatas)
        .zip(distances)
        .map(|(((id, description), metadata), distance)| SearchResult {
            id,
            description,
            metadata,
            similarity_score: 1.0 - distance,
        })
        .collect())
}

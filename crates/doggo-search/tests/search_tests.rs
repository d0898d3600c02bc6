use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tempfile::TempDir;

use doggo_core::error::{Error, Result};
use doggo_core::store::ConfigStore;
use doggo_core::traits::{ConfigSource, Embedder, VectorIndex};
use doggo_core::types::{ConfigRecord, ImageRecord, Include, Metadata, QueryResponse};
use doggo_embed::FakeEmbedder;
use doggo_search::{format_preview, Searcher};
use doggo_vector::LanceImageIndex;

struct StaticConfig(ConfigRecord);

impl ConfigSource for StaticConfig {
    fn load_config(&self) -> Result<ConfigRecord> {
        Ok(self.0.clone())
    }
}

fn keyed_config() -> StaticConfig {
    StaticConfig(ConfigRecord { openai_api_key: "sk-test-1234567890".into(), ..ConfigStore::default_config() })
}

/// Returns a fixed vector and records what it was asked for.
#[derive(Default)]
struct StubEmbedder {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl Embedder for StubEmbedder {
    fn embed(&self, api_key: &str, model: &str, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((api_key.into(), model.into(), text.into()));
        Ok(vec![0.1, 0.2, 0.3])
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _api_key: &str, _model: &str, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Provider("rate limited".into()))
    }
}

/// Hands back a canned response and remembers the requested `n_results`.
struct StubIndex {
    response: QueryResponse,
    requested: Arc<Mutex<Vec<(Vec<f32>, usize, Include)>>>,
}

impl StubIndex {
    fn new(response: QueryResponse) -> Self {
        Self { response, requested: Arc::default() }
    }
}

impl VectorIndex for StubIndex {
    fn query(&self, embedding: &[f32], n_results: usize, include: Include) -> Result<QueryResponse> {
        self.requested.lock().unwrap().push((embedding.to_vec(), n_results, include));
        Ok(self.response.clone())
    }
}

fn one_dog_response() -> QueryResponse {
    let meta: Metadata = match json!({"file_path": "/p", "file_name": "n", "file_size": 2048}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };
    QueryResponse {
        ids: vec![vec!["a".into()]],
        documents: vec![vec!["a dog".into()]],
        metadatas: vec![vec![meta]],
        distances: vec![vec![0.2]],
    }
}

#[test]
fn end_to_end_with_stubs() {
    let embedder = StubEmbedder::default();
    let seen = embedder.seen.clone();
    let index = StubIndex::new(one_dog_response());
    let requested = index.requested.clone();
    let searcher = Searcher::new(keyed_config(), index, Box::new(embedder));

    let results = searcher.search_similar_images("dog", 1).expect("search");
    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert_eq!(hit.id, "a");
    assert_eq!(hit.description, "a dog");
    assert_eq!(hit.metadata["file_name"], "n");
    assert!((hit.similarity_score - 0.8).abs() < 1e-6, "score {}", hit.similarity_score);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], ("sk-test-1234567890".to_string(), "text-embedding-3-small".to_string(), "dog".to_string()));
    let requested = requested.lock().unwrap();
    assert_eq!(requested[0], (vec![0.1, 0.2, 0.3], 1, Include::all()));

    assert!(format_preview(hit).contains("🎯 Similarity: 80.0%"));
}

#[test]
fn empty_query_and_zero_limit_never_reach_the_provider() {
    let embedder = StubEmbedder::default();
    let calls = embedder.calls.clone();
    let index = StubIndex::new(one_dog_response());
    let requested = index.requested.clone();
    let searcher = Searcher::new(keyed_config(), index, Box::new(embedder));

    for (query, limit) in [("", 5), ("   \t", 5), ("dogs", 0)] {
        let err = searcher.search_similar_images(query, limit).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{query:?}/{limit}: {err:?}");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(requested.lock().unwrap().is_empty());
}

#[test]
fn missing_api_key_is_a_config_error() {
    let embedder = StubEmbedder::default();
    let calls = embedder.calls.clone();
    let searcher = Searcher::new(StaticConfig(ConfigStore::default_config()), StubIndex::new(one_dog_response()), Box::new(embedder));

    let err = searcher.generate_query_embedding("dog").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(err.to_string(), "OpenAI API key not configured");
    assert!(matches!(searcher.search_similar_images("dog", 3), Err(Error::Config(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn provider_failure_propagates() {
    let searcher = Searcher::new(keyed_config(), StubIndex::new(one_dog_response()), Box::new(FailingEmbedder));
    let err = searcher.search_similar_images("dog", 3).unwrap_err();
    assert!(matches!(err, Error::Provider(ref m) if m == "rate limited"), "got {err:?}");
}

#[test]
fn custom_model_is_forwarded() {
    let embedder = StubEmbedder::default();
    let seen = embedder.seen.clone();
    let searcher = Searcher::new(keyed_config(), StubIndex::new(one_dog_response()), Box::new(embedder)).with_model("text-embedding-3-large");
    searcher.generate_query_embedding("cat").unwrap();
    assert_eq!(seen.lock().unwrap()[0].1, "text-embedding-3-large");
}

#[test]
fn config_store_key_change_is_seen_by_next_search() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path().join(".doggo"));
    store.initialize().unwrap();
    let searcher = Searcher::new(&store, StubIndex::new(one_dog_response()), Box::new(StubEmbedder::default()));

    assert!(matches!(searcher.search_similar_images("dog", 1), Err(Error::Config(_))));
    store.set_api_key("sk-now-configured").unwrap();
    assert_eq!(searcher.search_similar_images("dog", 1).unwrap().len(), 1);
}

#[test]
fn full_stack_with_fake_embedder_and_lancedb() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path().join(".doggo"));
    store.initialize().unwrap();
    store.set_api_key("sk-offline-test-key").unwrap();

    let dim = 32;
    let fake = FakeEmbedder::new(dim);
    let index = LanceImageIndex::open(&tmp.path().join("db"), "images", dim).unwrap();
    let descriptions = [
        ("img-dog", "brown dog running on sandy beach", 2048u64),
        ("img-cat", "grey cat sleeping on sofa cushion", 500),
        ("img-car", "red sports car parked downtown", 5_242_880),
    ];
    let records: Vec<ImageRecord> = descriptions
        .iter()
        .map(|(id, text, size)| ImageRecord {
            id: id.to_string(),
            description: text.to_string(),
            file_path: format!("/photos/{id}.png"),
            file_name: format!("{id}.png"),
            file_size: *size,
            vector: fake.embed("", "", text).unwrap(),
        })
        .collect();
    index.add_images(&records).unwrap();

    let searcher = Searcher::new(&store, index, Box::new(FakeEmbedder::new(dim)));
    let results = searcher.search_similar_images("brown dog running on sandy beach", 2).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "img-dog");
    assert!((results[0].similarity_score - 1.0).abs() < 1e-4, "score {}", results[0].similarity_score);
    assert!(results[0].similarity_score >= results[1].similarity_score);
    assert!(format_preview(&results[0]).contains("📁 File: img-dog.png"));
}

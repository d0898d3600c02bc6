//! Embedding providers for query text.
//!
//! [`OpenAiEmbedder`] talks to an OpenAI-compatible `/embeddings` endpoint.
//! [`FakeEmbedder`] hashes tokens into a fixed-size vector and never touches
//! the network; it is selected with `DOGGO_USE_FAKE_EMBEDDINGS=true`.

use doggo_core::config::Settings;
use doggo_core::error::Result;
use doggo_core::traits::Embedder;
use tracing::info;

mod fake;
mod openai;

pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

pub fn get_default_embedder(settings: &Settings) -> Result<Box<dyn Embedder>> {
    if settings.use_fake_embeddings {
        info!(dim = settings.embedding_dim, "using fake embedder");
        return Ok(Box::new(FakeEmbedder::new(settings.embedding_dim)));
    }
    Ok(Box::new(OpenAiEmbedder::from_settings(settings)?))
}

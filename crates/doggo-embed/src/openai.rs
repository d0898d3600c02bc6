use std::time::Duration;

use doggo_core::config::Settings;
use doggo_core::error::{Error, Result};
use doggo_core::traits::Embedder;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Blocking client for an OpenAI-compatible embeddings endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
}

impl OpenAiEmbedder {
    pub fn new(api_base: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        // `None` lifts the blocking client's default 30s timeout.
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(e.to_string()))?;
        Ok(Self::with_client(client, api_base))
    }

    pub fn with_client(client: Client, api_base: impl Into<String>) -> Self {
        Self { client, api_base: api_base.into().trim_end_matches('/').to_string() }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.api_base.clone(), settings.request_timeout_secs.map(Duration::from_secs))
    }

    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_base)
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, api_key: &str, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint();
        debug!(%url, model, chars = text.len(), "requesting embedding");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest { model, input: text })
            .send()
            .map_err(|e| Error::Provider(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Provider(format!("OpenAI error {status}: {}", body.trim())));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| Error::Provider(format!("invalid embedding response: {e}")))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Provider("embedding response contained no data".into()))
    }
}

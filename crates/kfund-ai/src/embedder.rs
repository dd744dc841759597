//! Embedding generation via an OpenAI-compatible embeddings endpoint.
//!
//! Deterministic for identical input within a model version; failures and
//! timeouts surface as upstream errors rather than empty vectors.

use async_trait::async_trait;
use kfund_core::Error;
use serde::Deserialize;
use serde_json::json;

const SERVICE: &str = "embedding service";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Text-to-vector interface for retrieval.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Error>;

    /// Batch variant; one vector per input, in input order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error>;
}

/// OpenAI embeddings API client.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Construct from the environment. A missing `OPENAI_API_KEY` is a
    /// configuration error at startup, not a failure deep in retrieval.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Configuration("OPENAI_API_KEY is not set".into()))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(base_url, api_key, model))
    }

    fn upstream(message: impl ToString) -> Error {
        Error::Upstream {
            service: SERVICE,
            message: message.to_string(),
        }
    }

    async fn request(&self, input: serde_json::Value) -> Result<Vec<Vec<f32>>, Error> {
        let url = format!("{}/embeddings", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": input }))
            .send()
            .await
            .map_err(Self::upstream)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("{status}: {body}")));
        }

        let parsed: EmbeddingsResponse = resp.json().await.map_err(Self::upstream)?;
        Ok(parsed.data.into_iter().map(|row| row.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        let mut vectors = self.request(json!(text)).await?;
        vectors
            .pop()
            .ok_or_else(|| Self::upstream("response contained no embedding"))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let vectors = self.request(json!(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(Self::upstream(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_response_parses() {
        let raw = r#"{
            "data": [
                {"embedding": [0.1, 0.2], "index": 0},
                {"embedding": [0.3, 0.4], "index": 1}
            ],
            "model": "text-embedding-3-small"
        }"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[1].embedding, vec![0.3, 0.4]);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let embedder = OpenAiEmbedder::new(
            "https://api.openai.com/v1/".into(),
            "sk-test".into(),
            DEFAULT_MODEL.into(),
        );
        assert_eq!(embedder.base_url, "https://api.openai.com/v1");
    }
}

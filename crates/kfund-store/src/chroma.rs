//! HTTP client for a Chroma-style vector index server.
//!
//! Collection records carry `{id, content, embedding, source,
//! regulation_category, chunk_index}`; queries return nearest neighbours
//! with their metadata so the retriever can rank by source authority.

use async_trait::async_trait;
use kfund_core::Error;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{ChunkRecord, SearchHit, VectorIndex};

const SERVICE: &str = "vector index";

/// Remote vector index over Chroma's REST API.
pub struct ChromaIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    documents: Vec<Vec<String>>,
    metadatas: Vec<Vec<serde_json::Value>>,
    distances: Vec<Vec<f32>>,
}

impl ChromaIndex {
    /// Create a client for the given server base URL and collection name.
    ///
    /// `base_url` should be like `http://localhost:8000` (no trailing slash).
    pub fn new(base_url: String, collection: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
        }
    }

    fn upstream(message: impl ToString) -> Error {
        Error::Upstream {
            service: SERVICE,
            message: message.to_string(),
        }
    }

    /// Resolve the collection name to its id, or `NotFound` if absent.
    async fn collection_id(&self) -> Result<String, Error> {
        let url = format!("{}/api/v1/collections/{}", self.base_url, self.collection);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::upstream)?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(self.collection.clone()));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("{status}: {body}")));
        }

        let info: CollectionInfo = resp.json().await.map_err(Self::upstream)?;
        Ok(info.id)
    }

    async fn create_collection(&self) -> Result<String, Error> {
        let url = format!("{}/api/v1/collections", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "name": self.collection, "get_or_create": true }))
            .send()
            .await
            .map_err(Self::upstream)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("create collection {status}: {body}")));
        }

        let info: CollectionInfo = resp.json().await.map_err(Self::upstream)?;
        Ok(info.id)
    }

    async fn add_records(&self, collection_id: &str, records: &[ChunkRecord]) -> Result<(), Error> {
        if records.is_empty() {
            return Ok(());
        }

        let body = json!({
            "ids": records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            "embeddings": records.iter().map(|r| &r.embedding).collect::<Vec<_>>(),
            "documents": records.iter().map(|r| r.content.as_str()).collect::<Vec<_>>(),
            "metadatas": records
                .iter()
                .map(|r| json!({
                    "source": r.source,
                    "regulation_category": r.regulation_category,
                    "chunk_index": r.chunk_index,
                }))
                .collect::<Vec<_>>(),
        });

        let url = format!("{}/api/v1/collections/{collection_id}/add", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::upstream)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("add {status}: {text}")));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for ChromaIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>, Error> {
        let collection_id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{collection_id}/query", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(&json!({
                "query_embeddings": [vector],
                "n_results": top_k,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await
            .map_err(Self::upstream)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("query {status}: {body}")));
        }

        let parsed: QueryResponse = resp.json().await.map_err(Self::upstream)?;

        let documents = parsed.documents.into_iter().next().unwrap_or_default();
        let metadatas = parsed.metadatas.into_iter().next().unwrap_or_default();
        let distances = parsed.distances.into_iter().next().unwrap_or_default();

        let hits = documents
            .into_iter()
            .zip(metadatas)
            .zip(distances.into_iter().chain(std::iter::repeat(0.0)))
            .map(|((content, meta), distance)| SearchHit {
                content,
                source: meta
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                // Chroma reports distance; smaller is closer.
                score: 1.0 - distance,
            })
            .collect();

        Ok(hits)
    }

    async fn upsert(&self, records: &[ChunkRecord]) -> Result<(), Error> {
        let collection_id = self.collection_id().await?;
        self.add_records(&collection_id, records).await
    }

    async fn recreate(&self, records: &[ChunkRecord]) -> Result<(), Error> {
        // Full replacement: drop the collection if present, then create fresh.
        let url = format!("{}/api/v1/collections/{}", self.base_url, self.collection);
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(Self::upstream)?;
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("delete collection {status}: {body}")));
        }

        let collection_id = self.create_collection().await?;
        self.add_records(&collection_id, records).await?;

        info!(
            collection = %self.collection,
            records = records.len(),
            "recreated index collection"
        );
        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool, Error> {
        match self.collection_id().await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn count(&self) -> Result<usize, Error> {
        let collection_id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{collection_id}/count", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::upstream)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("count {status}: {body}")));
        }

        resp.json::<usize>().await.map_err(Self::upstream)
    }
}

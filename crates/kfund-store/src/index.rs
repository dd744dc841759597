//! Vector index abstraction.
//!
//! The index itself is an external collaborator; this trait is the seam the
//! retriever and ingestion depend on, keeping both testable with fakes.

use async_trait::async_trait;
use kfund_core::Error;

use crate::ChunkRecord;

/// One nearest-neighbour match returned by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub source: String,
    pub score: f32,
}

/// Stateless request/response interface to a vector index holding one
/// collection of regulation chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest neighbours to `vector` by content similarity.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>, Error>;

    /// Add records to the collection.
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<(), Error>;

    /// Replace the whole collection: delete (if present) then create and
    /// load. Ingestion idempotency relies on this, not incremental merge.
    async fn recreate(&self, records: &[ChunkRecord]) -> Result<(), Error>;

    /// Whether the collection exists at all — distinct from existing but
    /// empty.
    async fn collection_exists(&self) -> Result<bool, Error>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<usize, Error>;
}

//! Persisted record layout for the vector index.

use kfund_core::Chunk;
use serde::{Deserialize, Serialize};

/// One index record per chunk.
///
/// The `id` is derived from the chunk's position in the ingestion run, not
/// its content, so re-ingestion is idempotent by full-collection
/// replacement rather than incremental merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub source: String,
    pub regulation_category: String,
    pub chunk_index: usize,
}

impl ChunkRecord {
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Self::id_for(chunk.chunk_index),
            content: chunk.content,
            embedding,
            source: chunk.source,
            regulation_category: chunk.category,
            chunk_index: chunk.chunk_index,
        }
    }

    /// Stable position-derived record id.
    pub fn id_for(chunk_index: usize) -> String {
        format!("chunk_{chunk_index}")
    }
}

//! Storage layer: persisted chunk records and the vector index interface.

mod chroma;
mod index;
mod record;

pub use chroma::ChromaIndex;
pub use index::{SearchHit, VectorIndex};
pub use record::ChunkRecord;

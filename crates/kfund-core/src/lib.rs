//! Core domain types, document chunking, and shared configuration.

pub mod chunker;
pub mod config;
mod error;
pub mod types;

pub use chunker::{Chunk, Chunker};
pub use config::EngineConfig;
pub use error::Error;
pub use types::{
    Answer, BatchReport, Citation, Classification, ClassificationResult, Confidence, Document,
    ItemOutcome, Judgment, LineItem, Payer, Totals,
};

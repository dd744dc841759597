//! Retrieval-and-classification engine for K Fund allowability.
//!
//! Pipeline per line item: retrieve a grounding context from the vector
//! index (multi-query, deduplicated, authority-ranked), obtain a categorical
//! judgment from the reasoning service, then apply the deterministic rule
//! layers. The batch aggregator runs this across an event's line items with
//! bounded concurrency and per-item failure capture. Free-text questions
//! get a grounded answer with citations through the same retriever.

mod answer;
pub mod batch;
mod classify;
pub mod retriever;
pub mod rules;

#[cfg(test)]
mod fakes;

pub use batch::EventRequest;
pub use classify::ClassificationEngine;
pub use retriever::{GroundingContext, Retriever};

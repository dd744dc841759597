//! External AI collaborators: embeddings and the classification reasoner.

mod embedder;
mod reasoner;

pub use embedder::{Embedder, OpenAiEmbedder};
pub use reasoner::{OpenAiReasoner, Reasoner, CLASSIFY_PROMPT_VERSION};

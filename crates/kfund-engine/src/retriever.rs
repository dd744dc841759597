//! Multi-query retrieval with fingerprint deduplication and authority
//! ranking.
//!
//! Several distinct phrasings of the same question are issued against the
//! vector index to maximise recall; the merged results are deduplicated by
//! a prefix fingerprint of the chunk text and ranked authoritative-first so
//! primary-namespace regulation text leads the grounding context. Free-text
//! questions take the single-query path instead, preserving the index's
//! own relevance order.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use kfund_ai::Embedder;
use kfund_core::{EngineConfig, Error};
use kfund_store::{SearchHit, VectorIndex};
use tracing::debug;

const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Fingerprint length in characters. Collisions between genuinely distinct
/// chunks sharing a long common prefix are treated as the same chunk — an
/// accepted approximation of the dedup key, not full-content hashing.
const FINGERPRINT_CHARS: usize = 100;

/// A deduplicated retrieval result.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub content: String,
    pub source: String,
    /// Similarity score reported by the index for the retained copy.
    pub score: f32,
    /// True when the source belongs to the primary regulation namespace.
    pub is_authoritative: bool,
}

impl RetrievedChunk {
    fn from_hit(hit: SearchHit, config: &EngineConfig) -> Self {
        Self {
            is_authoritative: config.is_authoritative(&hit.source),
            content: hit.content,
            source: hit.source,
            score: hit.score,
        }
    }
}

/// Assembled grounding context plus the distinct sources it draws on.
#[derive(Debug, Clone)]
pub struct GroundingContext {
    pub context: String,
    pub sources: Vec<String>,
}

/// Query-time retriever over injected embedding and index collaborators.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    config: EngineConfig,
}

/// The fixed set of query phrasings issued per line item. Wording is a
/// recall tuning knob, not a contract.
fn query_variants(description: &str) -> [String; 4] {
    [
        format!("Is {description} allowable under K Fund EDCS representational expenses?"),
        format!("K Fund classification rules for {description}"),
        format!("22 U.S.C. 2671 allowable expenses {description}"),
        "K Fund always allowable never allowable items list".to_string(),
    ]
}

fn fingerprint(content: &str) -> String {
    content.chars().take(FINGERPRINT_CHARS).collect()
}

/// Merge hits from all query variants: fingerprint dedup with
/// authoritative promotion, stable ranking, truncation to the context
/// budget.
///
/// Authoritative status is promoted, never demoted, by a later duplicate,
/// so the result is insensitive to which copy arrives first; the promoted
/// copy brings its own score.
fn merge_and_rank(
    hits: impl IntoIterator<Item = SearchHit>,
    config: &EngineConfig,
) -> Vec<RetrievedChunk> {
    let mut merged: HashMap<String, RetrievedChunk> = HashMap::new();
    for hit in hits {
        let chunk = RetrievedChunk::from_hit(hit, config);
        match merged.entry(fingerprint(&chunk.content)) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(chunk);
            }
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                if chunk.is_authoritative && !slot.get().is_authoritative {
                    slot.insert(chunk);
                }
            }
        }
    }

    // Authoritative first, then source name ascending; content as the
    // final tie-break keeps the output deterministic.
    let mut chunks: Vec<RetrievedChunk> = merged.into_values().collect();
    chunks.sort_by(|a, b| {
        b.is_authoritative
            .cmp(&a.is_authoritative)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.content.cmp(&b.content))
    });
    chunks.truncate(config.context_chunks);
    chunks
}

/// Join chunks into the prompt context, each entry prefixed with its source.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[Source: {}]\n{}", c.source, c.content))
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Retrieve a ranked grounding context for a line-item description.
    ///
    /// Fails with `NotFound` when the collection is absent and `Upstream`
    /// when a collaborator is unavailable — never an empty context standing
    /// in for "no relevant regulation".
    pub async fn retrieve(&self, description: &str) -> Result<GroundingContext, Error> {
        if !self.index.collection_exists().await? {
            return Err(Error::NotFound("regulation collection".into()));
        }

        let queries = query_variants(description);
        let searches = queries.iter().map(|query| async move {
            let vector = self.embedder.embed(query).await?;
            self.index
                .query(&vector, self.config.per_query_results)
                .await
        });
        let per_query_hits = try_join_all(searches).await?;

        let chunks = merge_and_rank(per_query_hits.into_iter().flatten(), &self.config);

        let sources: BTreeSet<String> = chunks.iter().map(|c| c.source.clone()).collect();
        let context = build_context(&chunks);

        debug!(
            item = description,
            chunks = chunks.len(),
            sources = sources.len(),
            "assembled grounding context"
        );

        Ok(GroundingContext {
            context,
            sources: sources.into_iter().collect(),
        })
    }

    /// Single-query search for a free-text question.
    ///
    /// The question is embedded as asked and the index's relevance order
    /// is preserved, so scores in the result are meaningful per-question
    /// ranks rather than artifacts of the variant merge.
    pub async fn search(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, Error> {
        if !self.index.collection_exists().await? {
            return Err(Error::NotFound("regulation collection".into()));
        }
        let vector = self.embedder.embed(question).await?;
        let hits = self.index.query(&vector, top_k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk::from_hit(hit, &self.config))
            .collect())
    }
}

//! In-crate fakes for the external collaborators.

use async_trait::async_trait;
use kfund_ai::{Embedder, Reasoner};
use kfund_core::{Classification, Confidence, Error, Judgment, LineItem};
use kfund_store::{ChunkRecord, SearchHit, VectorIndex};

/// Embedder returning a fixed tiny vector; retrieval tests only need the
/// call to succeed.
pub struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, Error> {
        Ok(vec![0.0, 1.0, 0.0])
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        Ok(texts.iter().map(|_| vec![0.0, 1.0, 0.0]).collect())
    }
}

/// Index returning the same canned hits for every query.
pub struct FakeIndex {
    hits: Vec<SearchHit>,
    exists: bool,
}

impl FakeIndex {
    pub fn returning(hits: Vec<SearchHit>) -> Self {
        Self { hits, exists: true }
    }

    pub fn without_collection() -> Self {
        Self {
            hits: vec![],
            exists: false,
        }
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>, Error> {
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn upsert(&self, _records: &[ChunkRecord]) -> Result<(), Error> {
        Ok(())
    }

    async fn recreate(&self, _records: &[ChunkRecord]) -> Result<(), Error> {
        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool, Error> {
        Ok(self.exists)
    }

    async fn count(&self) -> Result<usize, Error> {
        Ok(self.hits.len())
    }
}

/// Index whose every operation fails as an unavailable upstream.
pub struct FailingIndex;

fn index_down() -> Error {
    Error::Upstream {
        service: "vector index",
        message: "connection refused".into(),
    }
}

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<SearchHit>, Error> {
        Err(index_down())
    }

    async fn upsert(&self, _records: &[ChunkRecord]) -> Result<(), Error> {
        Err(index_down())
    }

    async fn recreate(&self, _records: &[ChunkRecord]) -> Result<(), Error> {
        Err(index_down())
    }

    async fn collection_exists(&self) -> Result<bool, Error> {
        Ok(true)
    }

    async fn count(&self) -> Result<usize, Error> {
        Err(index_down())
    }
}

/// Index whose queries never complete; everything else answers instantly.
pub struct StalledIndex;

#[async_trait]
impl VectorIndex for StalledIndex {
    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<SearchHit>, Error> {
        futures::future::pending().await
    }

    async fn upsert(&self, _records: &[ChunkRecord]) -> Result<(), Error> {
        Ok(())
    }

    async fn recreate(&self, _records: &[ChunkRecord]) -> Result<(), Error> {
        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool, Error> {
        Ok(true)
    }

    async fn count(&self) -> Result<usize, Error> {
        Ok(0)
    }
}

/// Reasoner that never completes.
pub struct StalledReasoner;

#[async_trait]
impl Reasoner for StalledReasoner {
    async fn classify(&self, _item: &LineItem, _context: &str) -> Result<Judgment, Error> {
        futures::future::pending().await
    }

    async fn answer(&self, _question: &str, _context: &str) -> Result<String, Error> {
        futures::future::pending().await
    }
}

/// Reasoner producing canned judgments by description keyword, mimicking
/// the established classification vocabulary. Descriptions containing
/// "fail" simulate an unavailable reasoning service.
pub struct KeywordReasoner;

#[async_trait]
impl Reasoner for KeywordReasoner {
    async fn classify(&self, item: &LineItem, _context: &str) -> Result<Judgment, Error> {
        let lower = item.item.to_lowercase();
        if lower.contains("fail") {
            return Err(Error::Upstream {
                service: "reasoning service",
                message: "request timed out".into(),
            });
        }

        let judgment = if lower.contains("gift") || lower.contains("vase") {
            Judgment {
                classification: Classification::Allowable,
                authority: "22 U.S.C. § 2694".into(),
                rationale: "Gifts to foreign officials are representational.".into(),
                regulation_text: "Gifts presented to foreign dignitaries...".into(),
                confidence: Confidence::High,
                needs_proration: false,
                questions: vec![],
            }
        } else if lower.contains("catering") || lower.contains("dinner") {
            Judgment {
                classification: Classification::Allowable,
                authority: "22 U.S.C. § 2671".into(),
                rationale: "Hospitality for foreign guests is representational.".into(),
                regulation_text: "Entertainment of foreign dignitaries...".into(),
                confidence: Confidence::High,
                needs_proration: true,
                questions: vec![],
            }
        } else if lower.contains("security") || lower.contains("transport") {
            Judgment {
                classification: Classification::NotAllowable,
                authority: "GAO guidance".into(),
                rationale: "Operational expense, not representational.".into(),
                regulation_text: String::new(),
                confidence: Confidence::High,
                needs_proration: false,
                questions: vec![],
            }
        } else {
            Judgment {
                classification: Classification::LegalReview,
                authority: String::new(),
                rationale: "Does not match established classification rules.".into(),
                regulation_text: String::new(),
                confidence: Confidence::Low,
                needs_proration: false,
                questions: vec!["Who is the beneficiary?".into()],
            }
        };
        Ok(judgment)
    }

    async fn answer(&self, question: &str, _context: &str) -> Result<String, Error> {
        let lower = question.to_lowercase();
        if lower.contains("fail") {
            return Err(Error::Upstream {
                service: "reasoning service",
                message: "request timed out".into(),
            });
        }
        Ok(
            "Gifts presented to foreign officials are allowable under 22 U.S.C. § 2694. \
             Confidence: HIGH"
                .into(),
        )
    }
}

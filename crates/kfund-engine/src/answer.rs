//! Grounded question answering over the regulation index.
//!
//! Free-text questions take the single-query retrieval path: the question
//! is embedded as asked, the top chunks become both the prompt context and
//! the citations, and the reasoning service writes a prose answer that
//! states its own confidence level.

use kfund_core::{Answer, Citation, Confidence, Error};
use tokio::time::timeout;
use tracing::info;

use crate::classify::ClassificationEngine;
use crate::retriever::build_context;

impl ClassificationEngine {
    /// Answer a compliance question with citations into the regulation set.
    pub async fn answer_question(&self, question: &str) -> Result<Answer, Error> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::Validation("question is empty".into()));
        }
        let budget = self.config().upstream_timeout();

        let chunks = timeout(
            budget,
            self.retriever.search(question, self.config().answer_results),
        )
        .await
        .map_err(|_| Error::Upstream {
            service: "vector index",
            message: "retrieval timed out".into(),
        })??;

        let context = build_context(&chunks);
        let answer = timeout(budget, self.reasoner.answer(question, &context))
            .await
            .map_err(|_| Error::Upstream {
                service: "reasoning service",
                message: "answer timed out".into(),
            })??;

        let confidence = extract_confidence(&answer);
        let citations: Vec<Citation> = chunks
            .into_iter()
            .map(|chunk| Citation {
                source: chunk.source,
                relevance_score: chunk.score,
                matched_text: chunk.content,
            })
            .collect();

        info!(
            question,
            citations = citations.len(),
            confidence = ?confidence,
            "answered compliance question"
        );
        Ok(Answer {
            answer,
            citations,
            confidence,
        })
    }
}

/// Stated-confidence heuristic over the answer prose. HIGH wins when
/// several levels appear; wording with no level reads as medium.
fn extract_confidence(answer: &str) -> Confidence {
    let upper = answer.to_uppercase();
    if upper.contains("HIGH") {
        Confidence::High
    } else if upper.contains("LOW") {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeEmbedder, FakeIndex, KeywordReasoner};
    use kfund_core::EngineConfig;
    use kfund_store::SearchHit;
    use std::sync::Arc;

    fn engine_with(hits: Vec<SearchHit>) -> ClassificationEngine {
        ClassificationEngine::new(
            Arc::new(FakeEmbedder),
            Arc::new(FakeIndex::returning(hits)),
            Arc::new(KeywordReasoner),
            EngineConfig::default(),
        )
    }

    fn hit(content: &str, source: &str, score: f32) -> SearchHit {
        SearchHit {
            content: content.into(),
            source: source.into(),
            score,
        }
    }

    #[tokio::test]
    async fn answer_carries_citations_in_relevance_order() {
        let answer = engine_with(vec![
            hit("Gift ceilings apply per recipient.", "K-Fund-Guidelines", 0.92),
            hit("General appropriations rule.", "GAO-Appropriations-Primer", 0.55),
        ])
        .answer_question("Can the K Fund pay for gifts to a visiting minister?")
        .await
        .unwrap();

        assert!(answer.answer.contains("22 U.S.C. § 2694"));
        assert_eq!(answer.confidence, kfund_core::Confidence::High);
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].source, "K-Fund-Guidelines");
        assert_eq!(answer.citations[0].relevance_score, 0.92);
        assert_eq!(
            answer.citations[0].matched_text,
            "Gift ceilings apply per recipient."
        );
        assert_eq!(answer.citations[1].relevance_score, 0.55);
    }

    #[tokio::test]
    async fn empty_question_is_a_validation_error() {
        let err = engine_with(vec![])
            .answer_question("   ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn missing_collection_is_not_found() {
        let engine = ClassificationEngine::new(
            Arc::new(FakeEmbedder),
            Arc::new(FakeIndex::without_collection()),
            Arc::new(KeywordReasoner),
            EngineConfig::default(),
        );
        let err = engine.answer_question("gift rules?").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn reasoner_failure_propagates_as_upstream() {
        let err = engine_with(vec![])
            .answer_question("this one will fail")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }

    #[test]
    fn confidence_extraction_heuristic() {
        assert_eq!(
            extract_confidence("Allowable. Confidence: HIGH"),
            Confidence::High
        );
        assert_eq!(
            extract_confidence("Unclear authority. Confidence: low"),
            Confidence::Low
        );
        assert_eq!(extract_confidence("No stated level."), Confidence::Medium);
        // HIGH is checked first when both appear.
        assert_eq!(
            extract_confidence("HIGH for gifts, LOW for transport"),
            Confidence::High
        );
    }
}

//! Per-item classification: retrieval, judgment, then the rule layers.

use std::sync::Arc;

use kfund_ai::{Embedder, Reasoner};
use kfund_core::{ClassificationResult, EngineConfig, Error, LineItem};
use kfund_store::VectorIndex;
use tokio::time::timeout;
use tracing::info;

use crate::retriever::Retriever;
use crate::rules;

/// Classification decision engine over injected collaborators.
///
/// Constructed once with shared handles and passed by reference; no
/// ambient singletons, so tests drive it entirely with fakes.
pub struct ClassificationEngine {
    pub(crate) retriever: Retriever,
    pub(crate) reasoner: Arc<dyn Reasoner>,
    config: EngineConfig,
}

impl ClassificationEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        reasoner: Arc<dyn Reasoner>,
        config: EngineConfig,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder, index, config.clone()),
            reasoner,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify a single line item.
    ///
    /// Retrieval and the reasoning call each run under the configured
    /// timeout; an elapsed timeout is an upstream failure, not a retry.
    pub async fn classify_item(&self, item: &LineItem) -> Result<ClassificationResult, Error> {
        item.validate()?;
        let budget = self.config.upstream_timeout();

        let grounding = timeout(budget, self.retriever.retrieve(&item.item))
            .await
            .map_err(|_| Error::Upstream {
                service: "vector index",
                message: "retrieval timed out".into(),
            })??;

        let judgment = timeout(budget, self.reasoner.classify(item, &grounding.context))
            .await
            .map_err(|_| Error::Upstream {
                service: "reasoning service",
                message: "classification timed out".into(),
            })??;

        let mut result = rules::apply(item, &judgment, &self.config);
        result.sources_consulted = grounding.sources;

        info!(
            item = %item.item,
            classification = result.classification.as_str(),
            k_fund_amount = result.k_fund_amount,
            flagged = result.flagged,
            "classified line item"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeEmbedder, FakeIndex, KeywordReasoner, StalledIndex, StalledReasoner};
    use kfund_core::{Classification, Payer};
    use kfund_store::SearchHit;

    fn engine() -> ClassificationEngine {
        let hits = vec![SearchHit {
            content: "Gifts presented to foreign dignitaries are representational.".into(),
            source: "K-Fund-Guidelines-2024".into(),
            score: 0.95,
        }];
        ClassificationEngine::new(
            Arc::new(FakeEmbedder),
            Arc::new(FakeIndex::returning(hits)),
            Arc::new(KeywordReasoner),
            EngineConfig::default(),
        )
    }

    fn item(desc: &str, cost: f64, foreign: u32, total: u32) -> LineItem {
        LineItem {
            item: desc.into(),
            cost,
            foreign_guests: foreign,
            total_guests: total,
        }
    }

    #[tokio::test]
    async fn gift_classifies_allowable_with_sources() {
        let result = engine()
            .classify_item(&item("Crystal vase gift for Ambassador", 2500.0, 0, 0))
            .await
            .unwrap();
        assert_eq!(result.classification, Classification::Allowable);
        assert_eq!(result.k_fund_amount, 2500.0);
        assert!(!result.prorated);
        assert_eq!(
            result.sources_consulted,
            vec!["K-Fund-Guidelines-2024".to_string()]
        );
    }

    #[tokio::test]
    async fn catering_prorates() {
        let result = engine()
            .classify_item(&item("Dinner catering service", 10_000.0, 30, 100))
            .await
            .unwrap();
        assert_eq!(result.k_fund_amount, 3000.0);
        assert!(result.prorated);
        assert_eq!(result.payer, Payer::Split);
    }

    #[tokio::test]
    async fn prohibited_item_overrides_judgment() {
        // KeywordReasoner would say Allowable for a gift; "spouse" wins.
        let result = engine()
            .classify_item(&item("Gift baskets for spouse program", 800.0, 10, 20))
            .await
            .unwrap();
        assert_eq!(result.classification, Classification::NotAllowable);
        assert_eq!(result.payer, Payer::PersonalFunds);
        assert_eq!(result.k_fund_amount, 0.0);
    }

    #[tokio::test]
    async fn invalid_item_is_validation_error() {
        let err = engine()
            .classify_item(&item("", 100.0, 0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn reasoner_failure_propagates_as_upstream() {
        let err = engine()
            .classify_item(&item("guaranteed to fail", 100.0, 0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }

    #[tokio::test]
    async fn unresponsive_reasoner_times_out_as_upstream() {
        // Zero budget: the instant fakes still complete, but the stalled
        // reasoning call must surface as an upstream failure.
        let engine = ClassificationEngine::new(
            Arc::new(FakeEmbedder),
            Arc::new(FakeIndex::returning(vec![])),
            Arc::new(StalledReasoner),
            EngineConfig {
                upstream_timeout_secs: 0,
                ..EngineConfig::default()
            },
        );
        let err = engine
            .classify_item(&item("Crystal vase gift", 100.0, 0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream");
        assert!(err.to_string().contains("classification timed out"), "{err}");
    }

    #[tokio::test]
    async fn unresponsive_index_times_out_as_upstream() {
        let engine = ClassificationEngine::new(
            Arc::new(FakeEmbedder),
            Arc::new(StalledIndex),
            Arc::new(KeywordReasoner),
            EngineConfig {
                upstream_timeout_secs: 0,
                ..EngineConfig::default()
            },
        );
        let err = engine
            .classify_item(&item("Crystal vase gift", 100.0, 0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream");
        assert!(err.to_string().contains("retrieval timed out"), "{err}");
    }
}

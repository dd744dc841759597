//! Batch classification across an event's ordered line items.
//!
//! Items share the event's guest counts, applied uniformly before
//! processing. Classification runs as a bounded scatter/gather: items are
//! classified concurrently but the output sequence preserves input order
//! regardless of completion order. One item's failure is captured in its
//! own outcome and never poisons the others' totals.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use kfund_core::{
    BatchReport, Classification, ClassificationResult, Error, ItemOutcome, LineItem, Totals,
};
use tokio::sync::watch;
use tracing::warn;

use crate::classify::ClassificationEngine;

/// One event's line items with the shared guest-count context.
#[derive(Debug, Clone)]
pub struct EventRequest {
    pub event_name: String,
    pub foreign_guests: u32,
    pub total_guests: u32,
    pub line_items: Vec<LineItem>,
}

impl ClassificationEngine {
    /// Classify every line item of an event and compute event totals.
    ///
    /// `cancel` is a cooperative stop signal: items still pending when it
    /// turns true report as cancelled and are omitted from totals rather
    /// than counted as zero-cost NOT_ALLOWABLE.
    pub async fn classify_batch(
        &self,
        request: EventRequest,
        cancel: Option<watch::Receiver<bool>>,
    ) -> BatchReport {
        let EventRequest {
            event_name,
            foreign_guests,
            total_guests,
            line_items,
        } = request;

        let items = line_items.into_iter().map(|mut item| {
            item.foreign_guests = foreign_guests;
            item.total_guests = total_guests;
            item
        });

        let outcomes: Vec<ItemOutcome> = stream::iter(items)
            .map(|item| {
                let cancel = cancel.clone();
                async move { self.classify_one(item, cancel).await }
            })
            .buffered(self.config().batch_concurrency.max(1))
            .collect()
            .await;

        let totals = compute_totals(&outcomes);
        let foreign_percentage = if total_guests > 0 {
            f64::from(foreign_guests) / f64::from(total_guests) * 100.0
        } else {
            0.0
        };

        BatchReport {
            event_name,
            foreign_guests,
            total_guests,
            foreign_percentage,
            line_items: outcomes,
            totals,
            classified_at: Utc::now(),
        }
    }

    async fn classify_one(
        &self,
        item: LineItem,
        cancel: Option<watch::Receiver<bool>>,
    ) -> ItemOutcome {
        let result = match cancel {
            Some(mut rx) => {
                tokio::select! {
                    biased;
                    _ = cancelled(&mut rx) => {
                        return ItemOutcome::Cancelled {
                            item: item.item.clone(),
                            cost: item.cost,
                        };
                    }
                    result = self.classify_item(&item) => result,
                }
            }
            None => self.classify_item(&item).await,
        };
        into_outcome(item, result)
    }
}

/// Resolves when the signal turns true; pends forever otherwise.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            // Sender dropped without cancelling.
            futures::future::pending::<()>().await;
        }
    }
}

fn into_outcome(item: LineItem, result: Result<ClassificationResult, Error>) -> ItemOutcome {
    match result {
        Ok(result) => ItemOutcome::Classified { result },
        Err(err) => {
            warn!(item = %item.item, error = %err, "line item classification failed");
            ItemOutcome::Failed {
                item: item.item,
                cost: item.cost,
                kind: err.kind().to_string(),
                error: err.to_string(),
            }
        }
    }
}

/// Order-independent event totals over the classified outcomes. Failed and
/// cancelled items contribute nothing.
fn compute_totals(outcomes: &[ItemOutcome]) -> Totals {
    let mut totals = Totals::default();
    for result in outcomes.iter().filter_map(ItemOutcome::result) {
        match result.classification {
            Classification::Allowable => totals.k_fund += result.k_fund_amount,
            Classification::NotAllowable => totals.not_allowable += result.cost,
            Classification::LegalReview => totals.legal_review += result.cost,
        }
    }
    totals.total = totals.k_fund + totals.not_allowable + totals.legal_review;
    totals
}

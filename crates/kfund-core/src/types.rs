//! Domain types for K Fund line-item classification.
//!
//! Wire labels follow the established audit vocabulary: classification
//! outcomes are `K_FUND_ALLOWABLE` / `NOT_ALLOWABLE` / `LEGAL_REVIEW`, and
//! payers serialize as their human-readable budget designations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A regulation document prepared for ingestion. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Source name, e.g. the file stem `K-Fund-Guidelines-2024`.
    pub source: String,
    /// Regulation category tag, copied onto every chunk.
    pub category: String,
    pub text: String,
}

/// Final classification label for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "K_FUND_ALLOWABLE")]
    Allowable,
    #[serde(rename = "NOT_ALLOWABLE")]
    NotAllowable,
    #[serde(rename = "LEGAL_REVIEW")]
    LegalReview,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowable => "K_FUND_ALLOWABLE",
            Self::NotAllowable => "NOT_ALLOWABLE",
            Self::LegalReview => "LEGAL_REVIEW",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "K_FUND_ALLOWABLE" => Some(Self::Allowable),
            "NOT_ALLOWABLE" => Some(Self::NotAllowable),
            "LEGAL_REVIEW" => Some(Self::LegalReview),
            _ => None,
        }
    }
}

/// Confidence reported by the reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Which budget bears a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payer {
    #[serde(rename = "Operating Funds")]
    OperatingFunds,
    #[serde(rename = "Personal Funds")]
    PersonalFunds,
    #[serde(rename = "K Fund (EDCS)")]
    KFund,
    #[serde(rename = "K Fund (Requires Memo)")]
    KFundRequiresMemo,
    #[serde(rename = "K Fund / Operating (Split)")]
    Split,
    #[serde(rename = "Pending Review")]
    PendingReview,
}

impl Payer {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OperatingFunds => "Operating Funds",
            Self::PersonalFunds => "Personal Funds",
            Self::KFund => "K Fund (EDCS)",
            Self::KFundRequiresMemo => "K Fund (Requires Memo)",
            Self::Split => "K Fund / Operating (Split)",
            Self::PendingReview => "Pending Review",
        }
    }
}

/// An event line item submitted for classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Free-text description, e.g. "Reception catering services".
    pub item: String,
    pub cost: f64,
    #[serde(default)]
    pub foreign_guests: u32,
    #[serde(default)]
    pub total_guests: u32,
}

impl LineItem {
    pub fn validate(&self) -> Result<(), Error> {
        if self.item.trim().is_empty() {
            return Err(Error::Validation("item description is empty".into()));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(Error::Validation(format!(
                "cost must be a non-negative number, got {}",
                self.cost
            )));
        }
        if self.foreign_guests > self.total_guests && self.total_guests > 0 {
            return Err(Error::Validation(format!(
                "foreign guests ({}) exceed total guests ({})",
                self.foreign_guests, self.total_guests
            )));
        }
        Ok(())
    }
}

/// Categorical judgment produced by the external reasoning service.
///
/// Advisory input to the rule layers, not ground truth: deterministic
/// overrides may replace the label entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
    pub classification: Classification,
    #[serde(default)]
    pub authority: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub regulation_text: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub needs_proration: bool,
    /// Clarifying questions; only populated for LEGAL_REVIEW.
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Final, auditable decision for a single line item. Never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub item: String,
    pub cost: f64,
    pub classification: Classification,
    /// Amount chargeable to the K Fund. Always `<= cost`; positive only
    /// when the classification is Allowable.
    pub k_fund_amount: f64,
    pub authority: String,
    pub rationale: String,
    pub regulation_text: String,
    pub confidence: Confidence,
    pub prorated: bool,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub sources_consulted: Vec<String>,
    pub payer: Payer,
    pub flagged: bool,
    #[serde(default)]
    pub flag_reason: String,
    pub per_person_cost: f64,
}

/// One regulation chunk cited in a free-text answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    /// Similarity score the index reported for this chunk.
    pub relevance_score: f32,
    /// The retrieved regulation text the answer drew on.
    pub matched_text: String,
}

/// Grounded answer to a free-text compliance question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    /// Chunks consulted, in the index's relevance order.
    pub citations: Vec<Citation>,
    pub confidence: Confidence,
}

/// Per-item outcome within a batch. Failed and cancelled items carry no
/// fabricated numbers and contribute nothing to totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Classified {
        #[serde(flatten)]
        result: ClassificationResult,
    },
    Failed {
        item: String,
        cost: f64,
        kind: String,
        error: String,
    },
    Cancelled {
        item: String,
        cost: f64,
    },
}

impl ItemOutcome {
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            Self::Classified { result } => Some(result),
            _ => None,
        }
    }
}

/// Event-level monetary totals. Order-independent sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub k_fund: f64,
    pub not_allowable: f64,
    pub legal_review: f64,
    pub total: f64,
}

/// Classification report for one event's ordered line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub event_name: String,
    pub foreign_guests: u32,
    pub total_guests: u32,
    pub foreign_percentage: f64,
    /// Outcomes in input order, regardless of completion order.
    pub line_items: Vec<ItemOutcome>,
    pub totals: Totals,
    pub classified_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(desc: &str, cost: f64) -> LineItem {
        LineItem {
            item: desc.into(),
            cost,
            foreign_guests: 0,
            total_guests: 0,
        }
    }

    #[test]
    fn classification_wire_labels() {
        let json = serde_json::to_string(&Classification::Allowable).unwrap();
        assert_eq!(json, "\"K_FUND_ALLOWABLE\"");
        let parsed: Classification = serde_json::from_str("\"LEGAL_REVIEW\"").unwrap();
        assert_eq!(parsed, Classification::LegalReview);
    }

    #[test]
    fn classification_parse_rejects_unknown() {
        assert!(Classification::parse("ALLOWABLE").is_none());
        assert_eq!(
            Classification::parse("NOT_ALLOWABLE"),
            Some(Classification::NotAllowable)
        );
    }

    #[test]
    fn payer_serializes_as_label() {
        let json = serde_json::to_string(&Payer::Split).unwrap();
        assert_eq!(json, "\"K Fund / Operating (Split)\"");
        assert_eq!(Payer::KFundRequiresMemo.label(), "K Fund (Requires Memo)");
    }

    #[test]
    fn valid_line_item() {
        assert!(item("Reception catering", 8500.0).validate().is_ok());
    }

    #[test]
    fn empty_description_rejected() {
        let err = item("  ", 100.0).validate().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn negative_cost_rejected() {
        assert!(item("Catering", -1.0).validate().is_err());
        assert!(item("Catering", f64::NAN).validate().is_err());
    }

    #[test]
    fn foreign_exceeding_total_rejected() {
        let bad = LineItem {
            item: "Dinner".into(),
            cost: 100.0,
            foreign_guests: 20,
            total_guests: 10,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn zero_guest_counts_are_valid() {
        // Missing guest data is a policy question for the rule layers,
        // not a validation failure.
        let ok = LineItem {
            item: "Gift".into(),
            cost: 100.0,
            foreign_guests: 5,
            total_guests: 0,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn line_item_guest_counts_default() {
        let parsed: LineItem =
            serde_json::from_str(r#"{"item": "Floral centerpieces", "cost": 1200}"#).unwrap();
        assert_eq!(parsed.foreign_guests, 0);
        assert_eq!(parsed.total_guests, 0);
    }

    #[test]
    fn item_outcome_tagged_serialization() {
        let failed = ItemOutcome::Failed {
            item: "Catering".into(),
            cost: 500.0,
            kind: "upstream".into(),
            error: "reasoning service unavailable: timeout".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "upstream");
        assert!(failed.result().is_none());
    }
}

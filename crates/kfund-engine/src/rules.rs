//! Deterministic rule layers applied over the upstream judgment.
//!
//! The judgment is advisory input; these layers are pure functions of
//! (item, judgment, config) and run in a fixed order. Later layers may
//! override the outcome of earlier ones but are never skipped:
//!
//! 1. foreign fraction
//! 2. base allowable amount
//! 3. per-person cost (unconditional)
//! 4. prohibited-item override
//! 5. payer assignment
//! 6. soft per-person cost cap

use kfund_core::{
    Classification, ClassificationResult, EngineConfig, Judgment, LineItem, Payer,
};

/// One prohibited-item rule: a case-insensitive substring predicate and the
/// reason recorded when it fires. Evaluated top-down; first match wins.
pub struct DenyRule {
    pub keyword: &'static str,
    pub reason: &'static str,
}

const PROHIBITED_REASON: &str = "Prohibited item detected (e.g., personal/lavish)";

/// Prohibited items force NOT_ALLOWABLE / Personal Funds regardless of the
/// upstream judgment or its confidence.
pub const DENY_RULES: &[DenyRule] = &[
    DenyRule { keyword: "yacht", reason: PROHIBITED_REASON },
    DenyRule { keyword: "casino", reason: PROHIBITED_REASON },
    DenyRule { keyword: "gambling", reason: PROHIBITED_REASON },
    DenyRule { keyword: "spouse", reason: PROHIBITED_REASON },
    DenyRule { keyword: "family", reason: PROHIBITED_REASON },
    DenyRule { keyword: "vacation", reason: PROHIBITED_REASON },
    DenyRule { keyword: "personal", reason: PROHIBITED_REASON },
];

/// First deny rule matching the description, if any.
pub fn first_prohibited_match(description: &str) -> Option<&'static DenyRule> {
    let lower = description.to_lowercase();
    DENY_RULES.iter().find(|rule| lower.contains(rule.keyword))
}

/// Fraction of guests who are foreign.
///
/// With no guest data the configured policy decides: the original behavior
/// treats the expense as fully attributable to foreign guests, which
/// maximises the allowable amount when data is missing.
pub fn foreign_fraction(foreign_guests: u32, total_guests: u32, assume_full_when_unknown: bool) -> f64 {
    if total_guests > 0 {
        f64::from(foreign_guests) / f64::from(total_guests)
    } else if assume_full_when_unknown {
        1.0
    } else {
        0.0
    }
}

/// K Fund allowable amount under foreign-guest proration.
///
/// Report math: zero guests yields zero, independent of the policy default
/// used inside [`apply`].
pub fn calculate_proration(total_cost: f64, foreign_guests: u32, total_guests: u32) -> f64 {
    if total_guests == 0 {
        return 0.0;
    }
    total_cost * f64::from(foreign_guests) / f64::from(total_guests)
}

fn per_person_cost(cost: f64, total_guests: u32) -> f64 {
    if total_guests > 0 {
        cost / f64::from(total_guests)
    } else {
        0.0
    }
}

/// Apply the rule layers to one item and its upstream judgment.
pub fn apply(item: &LineItem, judgment: &Judgment, config: &EngineConfig) -> ClassificationResult {
    // 1–2: foreign fraction and base allowable amount.
    let fraction = foreign_fraction(
        item.foreign_guests,
        item.total_guests,
        config.assume_foreign_when_unknown,
    );
    let mut k_fund_amount = match judgment.classification {
        Classification::Allowable if judgment.needs_proration => item.cost * fraction,
        Classification::Allowable => item.cost,
        _ => 0.0,
    };

    // 3: per-person cost, computed whatever the outcome.
    let per_person = per_person_cost(item.cost, item.total_guests);

    let mut classification = judgment.classification;
    let mut prorated = judgment.needs_proration && classification == Classification::Allowable;
    let mut flagged = false;
    let mut flag_reason = String::new();

    // 4: prohibited-item override, then 5: payer assignment.
    let mut payer = if let Some(rule) = first_prohibited_match(&item.item) {
        classification = Classification::NotAllowable;
        k_fund_amount = 0.0;
        prorated = false;
        flagged = true;
        flag_reason = rule.reason.to_string();
        Payer::PersonalFunds
    } else {
        match classification {
            Classification::Allowable if prorated => Payer::Split,
            Classification::Allowable => Payer::KFund,
            Classification::LegalReview => Payer::PendingReview,
            Classification::NotAllowable => Payer::OperatingFunds,
        }
    };

    // 6: soft per-person cap.
    if !flagged && per_person > config.per_person_cap {
        flagged = true;
        flag_reason = format!("High per-person cost (${per_person:.2}). Justification required.");
        if payer == Payer::KFund {
            payer = Payer::KFundRequiresMemo;
        }
    }

    ClassificationResult {
        item: item.item.clone(),
        cost: item.cost,
        classification,
        k_fund_amount,
        authority: judgment.authority.clone(),
        rationale: judgment.rationale.clone(),
        regulation_text: judgment.regulation_text.clone(),
        confidence: judgment.confidence,
        prorated,
        questions: judgment.questions.clone(),
        sources_consulted: vec![],
        payer,
        flagged,
        flag_reason,
        per_person_cost: per_person,
    }
}

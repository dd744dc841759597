//! Card and table rendering for classification output.

use kfund_core::{Answer, BatchReport, ClassificationResult, ItemOutcome};

/// Print a single classification decision as a vertical card.
pub fn print_result(result: &ClassificationResult) {
    println!("=== {} ===", result.item);
    println!();
    println!("  {:<22} {}", "classification", result.classification.as_str());
    println!("  {:<22} {}", "payer", result.payer.label());
    println!("  {:<22} {}", "cost", money(result.cost));
    println!("  {:<22} {}", "k_fund_amount", money(result.k_fund_amount));
    if result.prorated {
        println!("  {:<22} yes", "prorated");
    }
    println!("  {:<22} {}", "per_person_cost", money(result.per_person_cost));
    if !result.authority.is_empty() {
        println!("  {:<22} {}", "authority", result.authority);
    }
    println!("  {:<22} {:?}", "confidence", result.confidence);
    if result.flagged {
        println!("  {:<22} {}", "flagged", result.flag_reason);
    }
    if !result.rationale.is_empty() {
        println!();
        println!("  {}", result.rationale);
    }
    for question in &result.questions {
        println!("  ? {question}");
    }
    if !result.sources_consulted.is_empty() {
        println!();
        println!("  sources: {}", result.sources_consulted.join(", "));
    }
}

/// Print an event report: one line per item, then the totals block.
pub fn print_report(report: &BatchReport) {
    println!("=== {} ===", report.event_name);
    println!(
        "  {} foreign / {} total guests ({:.0}% foreign)",
        report.foreign_guests, report.total_guests, report.foreign_percentage
    );
    println!();

    for outcome in &report.line_items {
        match outcome {
            ItemOutcome::Classified { result } => {
                let flag = if result.flagged { "  [FLAGGED]" } else { "" };
                println!(
                    "  {:<40} {:>12}  {:<18} {}{}",
                    truncate(&result.item, 40),
                    money(result.cost),
                    result.classification.as_str(),
                    result.payer.label(),
                    flag
                );
            }
            ItemOutcome::Failed { item, cost, error, .. } => {
                println!(
                    "  {:<40} {:>12}  FAILED: {}",
                    truncate(item, 40),
                    money(*cost),
                    error
                );
            }
            ItemOutcome::Cancelled { item, cost } => {
                println!(
                    "  {:<40} {:>12}  CANCELLED",
                    truncate(item, 40),
                    money(*cost)
                );
            }
        }
    }

    println!();
    println!("  {:<22} {:>12}", "K Fund", money(report.totals.k_fund));
    println!(
        "  {:<22} {:>12}",
        "Not allowable",
        money(report.totals.not_allowable)
    );
    println!(
        "  {:<22} {:>12}",
        "Legal review",
        money(report.totals.legal_review)
    );
    println!("  {:<22} {:>12}", "Total", money(report.totals.total));
}

/// Print a grounded answer with its citations.
pub fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);
    println!();
    println!("  confidence: {:?}", answer.confidence);
    if !answer.citations.is_empty() {
        println!("  citations:");
        for citation in &answer.citations {
            println!(
                "    {:<40} (relevance {:.2})",
                citation.source, citation.relevance_score
            );
        }
    }
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_two_decimals() {
        assert_eq!(money(4250.0), "$4250.00");
        assert_eq!(money(0.5), "$0.50");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("Reception catering", 40), "Reception catering");
        let long = "a".repeat(50);
        let cut = truncate(&long, 40);
        assert_eq!(cut.chars().count(), 40);
        assert!(cut.ends_with("..."));
    }
}

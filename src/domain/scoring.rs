//! Severity score and inspection readiness.

use crate::domain::{BusinessAggregate, StatusCounts};

/// Shown when a business has neither neighborhood nor district.
pub const NO_ADDRESS: &str = "Adres bilgisi yok";

/// Open complaints weigh 1.5, negatives 1.0, and every complaint adds 0.5. One decimal.
pub fn severity_score(counts: &StatusCounts) -> f64 {
    let open = f64::from(counts.pending + counts.in_review);
    let raw = open * 1.5 + f64::from(counts.negative) + f64::from(counts.total()) * 0.5;
    (raw * 10.0).round() / 10.0
}

/// Ready once something is under review and nothing is still waiting.
pub fn is_ready_for_inspection(counts: &StatusCounts) -> bool {
    counts.in_review > 0 && counts.pending == 0
}

pub fn display_address(neighborhood: Option<&str>, district: Option<&str>) -> String {
    let parts: Vec<&str> = [neighborhood, district]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        NO_ADDRESS.to_string()
    } else {
        parts.join(", ")
    }
}

/// Fills score, readiness and address from the counters.
pub fn score(agg: &mut BusinessAggregate) {
    agg.score = severity_score(&agg.counts);
    agg.is_ready_for_inspection = is_ready_for_inspection(&agg.counts);
    agg.business_address = display_address(agg.neighborhood.as_deref(), agg.district.as_deref());
}

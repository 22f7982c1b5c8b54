//! In-memory part of a recompute: aggregate, resolve, merge, score.

use crate::domain::aggregation::aggregate;
use crate::domain::merge::merge_groups;
use crate::domain::scoring::score;
use crate::domain::similarity::find_similar;
use crate::domain::{BusinessAggregate, ComplaintRecord};
use chrono::{DateTime, Utc};
use tracing::info;

/// Turns the full complaint log into scored aggregates, in first-seen order.
///
/// `now` stamps merge audit notes. Nothing here touches a store.
pub fn build_aggregates(complaints: &[ComplaintRecord], now: DateTime<Utc>) -> Vec<BusinessAggregate> {
    let mut table = aggregate(complaints);
    if table.is_empty() {
        info!(complaints = complaints.len(), "no named complaints; nothing to build");
        return Vec::new();
    }
    let groups = find_similar(table.iter());
    let exact_keys = table.len();
    merge_groups(&mut table, &groups, now);
    for agg in table.iter_mut() {
        score(agg);
    }
    info!(
        complaints = complaints.len(),
        exact_keys,
        similar_groups = groups.len(),
        businesses = table.len(),
        "aggregates built"
    );
    table.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComplaintStatus;
    use crate::domain::aggregation::tests::complaint;

    #[test]
    fn test_similar_names_merge_end_to_end() {
        let complaints = vec![
            complaint("c1", Some("Baba Kebap"), ComplaintStatus::Pending, Some("Konak"), Some("Alsancak")),
            complaint("c2", Some("Baba Kebab"), ComplaintStatus::InReview, Some("Konak"), Some("Alsancak")),
            complaint("c3", Some("Baba Kebab"), ComplaintStatus::Negative, Some("Konak"), Some("Alsancak")),
            complaint("c4", None, ComplaintStatus::Negative, Some("Konak"), Some("Alsancak")),
        ];
        let aggs = build_aggregates(&complaints, Utc::now());
        assert_eq!(aggs.len(), 1);
        let baba = &aggs[0];
        assert!(baba.merged);
        assert_eq!(baba.merged_count, 2);
        assert_eq!(baba.counts.total(), 3);
        assert_eq!(baba.complaint_ids.len(), 3);
        assert!(!baba.complaint_ids.contains("c4"));
        // (1 + 1) * 1.5 + 1 + 3 * 0.5
        assert_eq!(baba.score, 5.5);
        assert_eq!(baba.business_address, "Alsancak, Konak");
    }

    #[test]
    fn test_blank_district_shares_bucket_with_missing_one() {
        let complaints = vec![
            complaint("c1", Some("Baba Kebap"), ComplaintStatus::Pending, None, None),
            complaint("c2", Some("Baba Kebab"), ComplaintStatus::Negative, Some("  "), None),
        ];
        let aggs = build_aggregates(&complaints, Utc::now());
        assert_eq!(aggs.len(), 1);
        assert!(aggs[0].merged);
        assert_eq!(aggs[0].business_id, "baba kebap");
        assert_eq!(aggs[0].business_address, "Adres bilgisi yok");
    }

    #[test]
    fn test_empty_log() {
        assert!(build_aggregates(&[], Utc::now()).is_empty());
    }
}

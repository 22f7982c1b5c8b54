//! Fuzzy name matching inside (district, neighborhood) buckets.
//!
//! Catches aggregates the exact key split apart ("Baba Kebap" vs "Baba Kebab").
//! Grouping is a single left-to-right pass with a visited set, not a transitive closure:
//! if A~B and B~C but not A~C, C stays out of A's group unless A matched it directly.

use crate::domain::BusinessAggregate;
use crate::domain::normalize::normalize;
use std::collections::{HashMap, HashSet};

/// Minimum bigram similarity for two names to be the same business.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// A group of business ids; the first id is the merge anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarGroup {
    pub group_id: String,
    pub business_ids: Vec<String>,
}

/// Sørensen–Dice over character bigrams, whitespace ignored. Symmetric, 1.0 for equal strings.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(a, b)
}

fn bucket_key(agg: &BusinessAggregate) -> (String, String) {
    (
        agg.district.clone().unwrap_or_default(),
        agg.neighborhood.clone().unwrap_or_default(),
    )
}

/// Finds groups of differently-keyed aggregates that name the same business.
///
/// Input order is the aggregation order; singletons are omitted from the output.
pub fn find_similar<'a, I>(aggregates: I) -> Vec<SimilarGroup>
where
    I: IntoIterator<Item = &'a BusinessAggregate>,
{
    let mut bucket_order: Vec<(String, String)> = Vec::new();
    let mut buckets: HashMap<(String, String), Vec<(&'a str, String)>> = HashMap::new();

    for agg in aggregates {
        let key = bucket_key(agg);
        let members = buckets.entry(key.clone()).or_insert_with(|| {
            bucket_order.push(key);
            Vec::new()
        });
        members.push((agg.business_id.as_str(), normalize(&agg.business_name)));
    }

    let mut groups = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    for key in &bucket_order {
        let members = &buckets[key];
        if members.len() <= 1 {
            continue;
        }

        for (i, (anchor_id, anchor_name)) in members.iter().enumerate() {
            if visited.contains(anchor_id) {
                continue;
            }

            let mut ids = vec![anchor_id.to_string()];
            for (candidate_id, candidate_name) in &members[i + 1..] {
                if visited.contains(candidate_id) {
                    continue;
                }
                if name_similarity(anchor_name, candidate_name) >= SIMILARITY_THRESHOLD {
                    ids.push(candidate_id.to_string());
                    visited.insert(*candidate_id);
                }
            }

            if ids.len() > 1 {
                groups.push(SimilarGroup {
                    group_id: format!("group_{}", groups.len() + 1),
                    business_ids: ids,
                });
            }
            visited.insert(*anchor_id);
        }
    }

    groups
}

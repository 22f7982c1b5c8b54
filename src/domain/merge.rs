//! Folds similar-name groups into their anchor aggregate.

use crate::domain::aggregation::AggregateTable;
use crate::domain::similarity::SimilarGroup;
use crate::domain::StatusCounts;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Merges every group into its first member and drops the absorbed aggregates.
///
/// The anchor keeps its id and identity fields; counters are summed, complaint ids are
/// unioned, and the display name becomes `"<anchor> (<absorbed>, ...)"`.
pub fn merge_groups(table: &mut AggregateTable, groups: &[SimilarGroup], now: DateTime<Utc>) {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut absorbed_ids: HashSet<String> = HashSet::new();

    for group in groups {
        let Some((anchor_id, rest)) = group.business_ids.split_first() else {
            continue;
        };
        if table.get(anchor_id).is_none() {
            continue;
        }

        let mut counts = StatusCounts::default();
        let mut complaint_ids = BTreeSet::new();
        let mut absorbed_names = Vec::new();
        for member_id in rest {
            let Some(member) = table.get(member_id) else {
                continue;
            };
            counts.absorb(&member.counts);
            complaint_ids.extend(member.complaint_ids.iter().cloned());
            absorbed_names.push(member.business_name.clone());
            absorbed_ids.insert(member_id.clone());
        }

        let Some(anchor) = table.get_mut(anchor_id) else {
            continue;
        };
        anchor.counts.absorb(&counts);
        anchor.complaint_ids.extend(complaint_ids);
        for name in &absorbed_names {
            anchor
                .notes
                .push(format!("{} - merged similar business: {}", stamp, name));
        }

        anchor.merged = true;
        anchor.merged_count = group.business_ids.len() as u32;
        anchor.original_name = Some(anchor.business_name.clone());
        if !absorbed_names.is_empty() {
            anchor.business_name =
                format!("{} ({})", anchor.business_name, absorbed_names.join(", "));
        }

        debug!(
            group = %group.group_id,
            anchor = %anchor.business_id,
            absorbed = absorbed_names.len(),
            "merged similar businesses"
        );
    }

    table.remove_all(&absorbed_ids);
}

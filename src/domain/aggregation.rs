//! Exact-key grouping of complaints into business aggregates.

use crate::domain::normalize::{build_id, present};
use crate::domain::{BusinessAggregate, ComplaintRecord};
use std::collections::HashMap;
use tracing::debug;

/// Aggregates keyed by business id, kept in first-seen order.
///
/// Built fresh for every recompute and dropped at the end of it.
#[derive(Debug, Default)]
pub struct AggregateTable {
    entries: Vec<BusinessAggregate>,
    positions: HashMap<String, usize>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, business_id: &str) -> Option<&BusinessAggregate> {
        self.positions.get(business_id).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, business_id: &str) -> Option<&mut BusinessAggregate> {
        let i = *self.positions.get(business_id)?;
        Some(&mut self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusinessAggregate> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BusinessAggregate> {
        self.entries.iter_mut()
    }

    pub fn into_vec(self) -> Vec<BusinessAggregate> {
        self.entries
    }

    fn entry_or_insert(&mut self, business_id: String, business_name: &str) -> &mut BusinessAggregate {
        let idx = match self.positions.get(&business_id) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.positions.insert(business_id.clone(), i);
                self.entries
                    .push(BusinessAggregate::new(business_id, business_name.to_string()));
                i
            }
        };
        &mut self.entries[idx]
    }

    /// Removes the given ids and reindexes. Order of survivors is preserved.
    pub fn remove_all(&mut self, ids: &std::collections::HashSet<String>) {
        if ids.is_empty() {
            return;
        }
        self.entries.retain(|a| !ids.contains(&a.business_id));
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, a)| (a.business_id.clone(), i))
            .collect();
    }
}

impl FromIterator<BusinessAggregate> for AggregateTable {
    fn from_iter<I: IntoIterator<Item = BusinessAggregate>>(iter: I) -> Self {
        let mut table = AggregateTable::default();
        for agg in iter {
            if table.positions.contains_key(&agg.business_id) {
                continue;
            }
            table.positions.insert(agg.business_id.clone(), table.entries.len());
            table.entries.push(agg);
        }
        table
    }
}

/// Single scan over all complaints. Records without a business name are skipped.
pub fn aggregate(complaints: &[ComplaintRecord]) -> AggregateTable {
    let mut table = AggregateTable::default();
    let mut skipped = 0usize;

    for complaint in complaints {
        let name = match complaint.business_name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let business_id = build_id(
            name,
            complaint.district.as_deref(),
            complaint.neighborhood.as_deref(),
            complaint.location.as_ref(),
        );

        let agg = table.entry_or_insert(business_id, name);
        agg.complaint_ids.insert(complaint.id.clone());
        agg.counts.record(complaint.status);

        // First non-blank value wins; later mentions never overwrite it.
        if agg.location.is_none() {
            agg.location = complaint.location;
        }
        if agg.district.is_none() {
            agg.district = present(complaint.district.as_deref()).map(str::to_string);
        }
        if agg.neighborhood.is_none() {
            agg.neighborhood = present(complaint.neighborhood.as_deref()).map(str::to_string);
        }
    }

    debug!(
        complaints = complaints.len(),
        aggregates = table.len(),
        skipped,
        "aggregation pass complete"
    );
    table
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{ComplaintStatus, Location};
    use chrono::{TimeZone, Utc};

    pub(crate) fn complaint(
        id: &str,
        name: Option<&str>,
        status: ComplaintStatus,
        district: Option<&str>,
        neighborhood: Option<&str>,
    ) -> ComplaintRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ComplaintRecord {
            id: id.to_string(),
            business_name: name.map(str::to_string),
            status,
            district: district.map(str::to_string),
            neighborhood: neighborhood.map(str::to_string),
            location: None,
            description: "Kötü hijyen".to_string(),
            contact_email: "vatandas@example.com".to_string(),
            category: "Hijyen".to_string(),
            admin_message: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_same_identifier_collapses() {
        let complaints = vec![
            complaint("c1", Some("Izmir Kebap"), ComplaintStatus::Pending, Some("Konak"), None),
            complaint("c2", Some("Izmir Kebap"), ComplaintStatus::Negative, Some("Konak"), None),
        ];
        let table = aggregate(&complaints);
        assert_eq!(table.len(), 1);
        let agg = table.get("izmir kebap_konak").unwrap();
        assert_eq!(agg.counts.total(), 2);
        assert_eq!(agg.counts.pending, 1);
        assert_eq!(agg.counts.negative, 1);
        assert_eq!(agg.complaint_ids.len(), 2);
    }

    #[test]
    fn test_missing_name_is_skipped() {
        let complaints = vec![
            complaint("c1", None, ComplaintStatus::Pending, Some("Konak"), None),
            complaint("c2", Some("   "), ComplaintStatus::Pending, Some("Konak"), None),
            complaint("c3", Some("Baba Kebap"), ComplaintStatus::Pending, Some("Konak"), None),
        ];
        let table = aggregate(&complaints);
        assert_eq!(table.len(), 1);
        let all_ids: Vec<&String> = table.iter().flat_map(|a| a.complaint_ids.iter()).collect();
        assert_eq!(all_ids, vec!["c3"]);
    }

    #[test]
    fn test_rejected_keeps_id_but_no_count() {
        let complaints = vec![complaint(
            "c1",
            Some("Baba Kebap"),
            ComplaintStatus::Rejected,
            None,
            None,
        )];
        let table = aggregate(&complaints);
        let agg = table.get("baba kebap").unwrap();
        assert_eq!(agg.counts.total(), 0);
        assert!(agg.complaint_ids.contains("c1"));
    }

    #[test]
    fn test_first_location_wins() {
        let mut first = complaint("c1", Some("Baba"), ComplaintStatus::Pending, None, None);
        let mut second = complaint("c2", Some("Baba"), ComplaintStatus::Pending, None, None);
        // Same 3-decimal bucket, different raw coordinates.
        first.location = Some(Location { lat: 38.4191, lng: 27.1281 });
        second.location = Some(Location { lat: 38.4189, lng: 27.1279 });
        let table = aggregate(&[first, second]);
        assert_eq!(table.len(), 1);
        let agg = table.iter().next().unwrap();
        assert_eq!(agg.location, Some(Location { lat: 38.4191, lng: 27.1281 }));
    }

    #[test]
    fn test_display_name_is_trimmed_first_mention() {
        let complaints = vec![
            complaint("c1", Some("  Baba Kebap "), ComplaintStatus::Pending, None, None),
            complaint("c2", Some("BABA KEBAP"), ComplaintStatus::Pending, None, None),
        ];
        let table = aggregate(&complaints);
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().next().unwrap().business_name, "Baba Kebap");
    }

    #[test]
    fn test_blank_location_fields_are_absent() {
        let complaints = vec![
            complaint("c1", Some("Baba Kebab"), ComplaintStatus::Pending, Some("  "), Some("")),
            complaint("c2", Some("Baba Kebab"), ComplaintStatus::Pending, Some("Konak"), None),
        ];
        let table = aggregate(&complaints);
        assert_eq!(table.len(), 2);
        let blank = table.get("baba kebab").unwrap();
        assert_eq!(blank.district, None);
        assert_eq!(blank.neighborhood, None);
        assert_eq!(table.get("baba kebab_konak").unwrap().district.as_deref(), Some("Konak"));
    }
}

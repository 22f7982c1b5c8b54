//! Reconciles freshly computed aggregates with the durable roster.
//!
//! - Unknown business → insert
//! - Known business, forced run → overwrite counts, ids, readiness, address and score
//! - Known business, lazy run → overwrite those only when the score moved
//! - Merge metadata is carried over whenever it differs, independent of the score gate
//!
//! `last_updated` moves only when something is written.

use crate::domain::{BusinessAggregate, BusinessRecord, DomainError};
use crate::ports::BusinessStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// A single pending write against the business store.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert(BusinessRecord),
    Update(BusinessRecord),
}

/// Counts of what a sync did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

fn merge_metadata_differs(existing: &BusinessRecord, agg: &BusinessAggregate) -> bool {
    existing.merged != agg.merged
        || existing.merged_count != agg.merged_count
        || existing.original_name != agg.original_name
        || existing.business_name != agg.business_name
}

/// Decides what, if anything, to write for one aggregate. Pure.
pub fn plan_write(
    existing: Option<&BusinessRecord>,
    agg: BusinessAggregate,
    force: bool,
    now: DateTime<Utc>,
) -> Option<WriteOp> {
    let Some(existing) = existing else {
        return Some(WriteOp::Insert(agg.into_record(now)));
    };

    let score_changed = existing.score != agg.score;
    let mut next = existing.clone();
    let mut dirty = false;

    if force || score_changed {
        next.counts = agg.counts;
        next.complaint_ids = agg.complaint_ids.clone();
        next.is_ready_for_inspection = agg.is_ready_for_inspection;
        next.business_address = agg.business_address.clone();
        next.score = agg.score;
        dirty = true;
    }

    if agg.merged && merge_metadata_differs(existing, &agg) {
        next.merged = agg.merged;
        next.merged_count = agg.merged_count;
        next.original_name = agg.original_name.clone();
        next.business_name = agg.business_name.clone();
        next.notes = agg.notes.clone();
        dirty = true;
    }

    if !dirty {
        return None;
    }
    next.last_updated = now;
    Some(WriteOp::Update(next))
}

/// Write phase of a recompute.
pub struct PersistenceSync {
    store: Arc<dyn BusinessStore>,
}

impl PersistenceSync {
    pub fn new(store: Arc<dyn BusinessStore>) -> Self {
        Self { store }
    }

    /// Looks up every aggregate, then issues all writes concurrently and waits for all of them.
    ///
    /// Any failed write fails the whole sync. Writes that already landed stay applied.
    pub async fn sync(
        &self,
        aggregates: Vec<BusinessAggregate>,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<SyncStats, DomainError> {
        let mut stats = SyncStats::default();
        let mut ops = Vec::with_capacity(aggregates.len());

        for agg in aggregates {
            let existing = self.store.find_by_id(&agg.business_id).await?;
            match plan_write(existing.as_ref(), agg, force, now) {
                Some(op) => ops.push(op),
                None => stats.unchanged += 1,
            }
        }

        let mut writes = JoinSet::new();
        for op in ops {
            let store = Arc::clone(&self.store);
            writes.spawn(async move {
                match op {
                    WriteOp::Insert(record) => store.insert(&record).await.map(|_| true),
                    WriteOp::Update(record) => store.update(&record).await.map(|_| false),
                }
            });
        }

        let mut first_error: Option<DomainError> = None;
        while let Some(joined) = writes.join_next().await {
            let outcome = joined
                .map_err(|e| DomainError::Repo(format!("write task failed: {}", e)))
                .and_then(|r| r);
            match outcome {
                Ok(true) => stats.inserted += 1,
                Ok(false) => stats.updated += 1,
                Err(e) => {
                    error!(error = %e, "business write failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        debug!(force, "all business writes settled");
        Ok(stats)
    }
}

//! Roster service. Serves the cached business roster or recomputes it from the complaint log.
//!
//! `analyze()` is lazy (staleness-gated), `force_update()` always recomputes.
//! Overlapping recomputes are not excluded; last write wins per business id.

use crate::domain::pipeline::build_aggregates;
use crate::domain::scoring::{is_ready_for_inspection, severity_score};
use crate::domain::{BusinessRecord, ComplaintRecord, DomainError, RefreshSummary};
use crate::ports::{BusinessStore, ComplaintStore};
use crate::usecases::persistence_sync::PersistenceSync;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Roster older than this many hours is recomputed on the next `analyze()`.
pub const DEFAULT_STALENESS_HOURS: i64 = 6;

/// True when the roster is empty or its newest `last_updated` is older than `threshold`.
pub fn is_stale(roster: &[BusinessRecord], now: DateTime<Utc>, threshold: Duration) -> bool {
    match roster.iter().map(|r| r.last_updated).max() {
        None => true,
        Some(newest) => now - newest > threshold,
    }
}

pub struct RosterService {
    complaints: Arc<dyn ComplaintStore>,
    businesses: Arc<dyn BusinessStore>,
    sync: PersistenceSync,
    staleness: Duration,
}

impl RosterService {
    pub fn new(
        complaints: Arc<dyn ComplaintStore>,
        businesses: Arc<dyn BusinessStore>,
        staleness: Duration,
    ) -> Self {
        let sync = PersistenceSync::new(Arc::clone(&businesses));
        Self {
            complaints,
            businesses,
            sync,
            staleness,
        }
    }

    /// Roster sorted by score (highest first), recomputed first if empty or stale.
    pub async fn analyze(&self) -> Result<Vec<BusinessRecord>, DomainError> {
        let roster = self.businesses.list_by_score().await?;
        if is_stale(&roster, Utc::now(), self.staleness) {
            info!(cached = roster.len(), "roster empty or stale; recomputing");
            return self.recompute(false).await;
        }
        Ok(roster)
    }

    /// Unconditional recompute. Every known business is rewritten.
    pub async fn force_update(&self) -> Result<RefreshSummary, DomainError> {
        let started = Instant::now();
        let roster = self.recompute(true).await?;
        let elapsed = started.elapsed();
        let message = format!(
            "{} business scores updated in {:.2} seconds.",
            roster.len(),
            elapsed.as_secs_f64()
        );
        info!(records = roster.len(), elapsed_ms = elapsed.as_millis() as u64, "forced refresh done");
        Ok(RefreshSummary {
            success: true,
            record_count: roster.len(),
            elapsed,
            message,
        })
    }

    /// Full pass: read every complaint, rebuild aggregates, write changes, re-read the roster.
    pub async fn recompute(&self, force: bool) -> Result<Vec<BusinessRecord>, DomainError> {
        let complaints = self.complaints.fetch_all().await?;
        let now = Utc::now();
        let aggregates = build_aggregates(&complaints, now);
        let stats = match self.sync.sync(aggregates, force, now).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, force, "recompute failed; roster left as last persisted");
                return Err(e);
            }
        };
        info!(
            inserted = stats.inserted,
            updated = stats.updated,
            unchanged = stats.unchanged,
            force,
            "roster synced"
        );
        self.businesses.list_by_score().await
    }

    /// The `limit` highest-scoring businesses.
    pub async fn top(&self, limit: usize) -> Result<Vec<BusinessRecord>, DomainError> {
        let mut roster = self.analyze().await?;
        roster.truncate(limit);
        Ok(roster)
    }

    /// One roster entry as stored. No recompute.
    pub async fn business(&self, business_id: &str) -> Result<BusinessRecord, DomainError> {
        self.businesses
            .find_by_id(business_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("business {}", business_id)))
    }

    /// Manual override of the inspection flag. The next written pass recomputes it.
    pub async fn set_inspection_flag(
        &self,
        business_id: &str,
        ready: bool,
    ) -> Result<BusinessRecord, DomainError> {
        let mut record = self.business(business_id).await?;
        record.is_ready_for_inspection = ready;
        self.businesses.update(&record).await?;
        info!(business_id, ready, "inspection flag set manually");
        Ok(record)
    }

    /// Folds `source_ids` into `target_id` and deletes the sources.
    ///
    /// Ids are unioned, counters summed and the score recomputed from the sums.
    /// Every business must exist before anything is written.
    pub async fn merge_businesses(
        &self,
        target_id: &str,
        source_ids: &[String],
    ) -> Result<BusinessRecord, DomainError> {
        let mut wanted: Vec<&str> = Vec::with_capacity(source_ids.len());
        for id in source_ids.iter().map(|s| s.trim()) {
            if !id.is_empty() && !wanted.contains(&id) {
                wanted.push(id);
            }
        }
        if wanted.is_empty() {
            return Err(DomainError::Invalid("no source businesses given".into()));
        }
        if wanted.contains(&target_id) {
            return Err(DomainError::Invalid(format!(
                "business {} cannot absorb itself",
                target_id
            )));
        }

        let mut target = self.business(target_id).await?;
        let mut sources = Vec::with_capacity(wanted.len());
        for id in &wanted {
            match self.businesses.find_by_id(id).await? {
                Some(source) => sources.push(source),
                None => return Err(DomainError::NotFound(format!("source business {}", id))),
            }
        }

        let now = Utc::now();
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let folded_before = if target.merged { target.merged_count } else { 1 };
        if target.original_name.is_none() {
            target.original_name = Some(target.business_name.clone());
        }
        for source in &sources {
            target.counts.absorb(&source.counts);
            target.complaint_ids.extend(source.complaint_ids.iter().cloned());
            target
                .notes
                .push(format!("{} - merged business: {}", stamp, source.business_name));
        }
        target.merged = true;
        target.merged_count = folded_before + sources.len() as u32;
        target.score = severity_score(&target.counts);
        target.is_ready_for_inspection = is_ready_for_inspection(&target.counts);
        target.last_updated = now;

        self.businesses.update(&target).await?;
        for id in &wanted {
            self.businesses.delete(id).await?;
        }
        info!(
            target = target_id,
            absorbed = wanted.len(),
            score = target.score,
            "businesses merged"
        );
        Ok(target)
    }

    /// Businesses whose district contains `district` (case-insensitive), highest score first.
    pub async fn businesses_in_district(
        &self,
        district: &str,
    ) -> Result<Vec<BusinessRecord>, DomainError> {
        let needle = district.to_lowercase();
        Ok(self
            .analyze()
            .await?
            .into_iter()
            .filter(|b| {
                b.district
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect())
    }

    pub async fn businesses_above(&self, min_score: f64) -> Result<Vec<BusinessRecord>, DomainError> {
        Ok(self
            .analyze()
            .await?
            .into_iter()
            .filter(|b| b.score >= min_score)
            .collect())
    }

    /// Complaints behind one roster entry, newest first. Unknown business → empty.
    pub async fn complaints_for_business(
        &self,
        business_id: &str,
    ) -> Result<Vec<ComplaintRecord>, DomainError> {
        let Some(business) = self.businesses.find_by_id(business_id).await? else {
            return Ok(Vec::new());
        };
        if business.complaint_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = business.complaint_ids.into_iter().collect();
        self.complaints.fetch_by_ids(&ids).await
    }
}

//! Refresh scheduler: keeps the roster current without anyone calling `analyze()`.
//!
//! Refreshes once at start, once per UTC day, and whenever complaints changed in the trailing window.
//! Does not block the main thread; uses tokio::time::sleep.

use crate::domain::DomainError;
use crate::ports::ComplaintStore;
use crate::usecases::roster_service::RosterService;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Why a cycle triggered a forced refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Daily,
    RecentChanges(u64),
}

pub struct RefreshScheduler {
    roster: Arc<RosterService>,
    complaints: Arc<dyn ComplaintStore>,
    /// Sleep between checks.
    check_interval: Duration,
    /// How far back a complaint change still counts as recent.
    recent_window: ChronoDuration,
}

impl RefreshScheduler {
    pub fn new(
        roster: Arc<RosterService>,
        complaints: Arc<dyn ComplaintStore>,
        check_interval: Duration,
        recent_window: ChronoDuration,
    ) -> Self {
        Self {
            roster,
            complaints,
            check_interval,
            recent_window,
        }
    }

    /// Runs until the process is stopped. Refresh failures are logged and the loop carries on.
    pub async fn run_loop(&self) -> Result<(), DomainError> {
        match self.roster.force_update().await {
            Ok(summary) => info!(records = summary.record_count, "startup refresh complete"),
            Err(e) => warn!(error = %e, "startup refresh failed"),
        }
        let mut last_daily = Utc::now().date_naive();

        loop {
            tokio::time::sleep(self.check_interval).await;
            match self.run_cycle(Utc::now(), &mut last_daily).await {
                Ok(Some(trigger)) => info!(?trigger, "scheduled refresh complete"),
                Ok(None) => info!(
                    check_secs = self.check_interval.as_secs(),
                    "no recent complaint changes; sleeping"
                ),
                Err(e) => warn!(error = %e, "scheduled refresh failed"),
            }
        }
    }

    /// One check at `now`. Runs a forced refresh if the day rolled over or complaints changed recently.
    pub async fn run_cycle(
        &self,
        now: DateTime<Utc>,
        last_daily: &mut NaiveDate,
    ) -> Result<Option<RefreshTrigger>, DomainError> {
        let trigger = if now.date_naive() > *last_daily {
            Some(RefreshTrigger::Daily)
        } else {
            let changed = self
                .complaints
                .count_changed_since(now - self.recent_window)
                .await?;
            (changed > 0).then_some(RefreshTrigger::RecentChanges(changed))
        };

        let Some(trigger) = trigger else {
            return Ok(None);
        };
        self.roster.force_update().await?;
        if trigger == RefreshTrigger::Daily {
            *last_daily = now.date_naive();
        }
        Ok(Some(trigger))
    }
}

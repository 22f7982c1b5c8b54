//! Domain entities. Pure data structures for the core business.
//!
//! No SQL/CSV types here; adapters map to and from these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a complaint. Transitions are driven outside the roster core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    Pending,
    InReview,
    Positive,
    Negative,
    Rejected,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InReview => "in-review",
            ComplaintStatus::Positive => "positive",
            ComplaintStatus::Negative => "negative",
            ComplaintStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ComplaintStatus::Pending),
            "in-review" => Ok(ComplaintStatus::InReview),
            "positive" => Ok(ComplaintStatus::Positive),
            "negative" => Ok(ComplaintStatus::Negative),
            "rejected" => Ok(ComplaintStatus::Rejected),
            other => Err(format!("unknown complaint status: {}", other)),
        }
    }
}

/// WGS84 point. Both coordinates are always present; a half-filled location is modelled as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Builds a location only when both coordinates are known.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Self { lat, lng }),
            _ => None,
        }
    }
}

/// A complaint as stored. The roster core only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub id: String,
    pub business_name: Option<String>,
    pub status: ComplaintStatus,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub location: Option<Location>,
    pub description: String,
    pub contact_email: String,
    pub category: String,
    pub admin_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-status tallies for one business identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u32,
    pub in_review: u32,
    pub positive: u32,
    pub negative: u32,
}

impl StatusCounts {
    pub fn total(&self) -> u32 {
        self.pending + self.in_review + self.positive + self.negative
    }

    /// Counts one complaint. Rejected complaints are tracked by id only.
    pub fn record(&mut self, status: ComplaintStatus) {
        match status {
            ComplaintStatus::Pending => self.pending += 1,
            ComplaintStatus::InReview => self.in_review += 1,
            ComplaintStatus::Positive => self.positive += 1,
            ComplaintStatus::Negative => self.negative += 1,
            ComplaintStatus::Rejected => {}
        }
    }

    pub fn absorb(&mut self, other: &StatusCounts) {
        self.pending += other.pending;
        self.in_review += other.in_review;
        self.positive += other.positive;
        self.negative += other.negative;
    }
}

/// Transient accumulation for one resolved business identity. Lives for a single recompute pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessAggregate {
    pub business_id: String,
    pub business_name: String,
    pub counts: StatusCounts,
    pub complaint_ids: BTreeSet<String>,
    pub location: Option<Location>,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub business_address: String,
    pub score: f64,
    pub is_ready_for_inspection: bool,
    pub merged: bool,
    pub merged_count: u32,
    pub original_name: Option<String>,
    pub notes: Vec<String>,
}

impl BusinessAggregate {
    pub fn new(business_id: String, business_name: String) -> Self {
        Self {
            business_id,
            business_name,
            counts: StatusCounts::default(),
            complaint_ids: BTreeSet::new(),
            location: None,
            district: None,
            neighborhood: None,
            business_address: String::new(),
            score: 0.0,
            is_ready_for_inspection: false,
            merged: false,
            merged_count: 0,
            original_name: None,
            notes: Vec::new(),
        }
    }

    /// Turns a scored aggregate into a durable record stamped at `now`.
    pub fn into_record(self, now: DateTime<Utc>) -> BusinessRecord {
        BusinessRecord {
            business_id: self.business_id,
            business_name: self.business_name,
            district: self.district,
            neighborhood: self.neighborhood,
            location: self.location,
            business_address: self.business_address,
            counts: self.counts,
            complaint_ids: self.complaint_ids,
            score: self.score,
            is_ready_for_inspection: self.is_ready_for_inspection,
            merged: self.merged,
            merged_count: self.merged_count,
            original_name: self.original_name,
            notes: self.notes,
            last_updated: now,
        }
    }
}

/// Durable roster entry. `business_id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_id: String,
    pub business_name: String,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub location: Option<Location>,
    pub business_address: String,
    pub counts: StatusCounts,
    pub complaint_ids: BTreeSet<String>,
    pub score: f64,
    pub is_ready_for_inspection: bool,
    pub merged: bool,
    pub merged_count: u32,
    pub original_name: Option<String>,
    pub notes: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl BusinessRecord {
    pub fn total_complaints(&self) -> u32 {
        self.counts.total()
    }
}

/// Outcome of a forced refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSummary {
    pub success: bool,
    pub record_count: usize,
    pub elapsed: std::time::Duration,
    pub message: String,
}

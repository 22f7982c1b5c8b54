//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{BusinessRecord, ComplaintRecord, ComplaintStatus, DomainError};
use chrono::{DateTime, Utc};

/// Complaint log. The roster core only reads it; intake writes it.
#[async_trait::async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Every stored complaint, in insertion order.
    async fn fetch_all(&self) -> Result<Vec<ComplaintRecord>, DomainError>;

    /// Complaints with the given ids, newest `created_at` first. Unknown ids are ignored.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ComplaintRecord>, DomainError>;

    async fn insert(&self, complaint: &ComplaintRecord) -> Result<(), DomainError>;

    /// Sets status (and optionally the admin message) and bumps `updated_at`.
    ///
    /// # Errors
    /// `DomainError::NotFound` if no complaint has this id.
    async fn update_status(
        &self,
        id: &str,
        status: ComplaintStatus,
        admin_message: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Number of complaints created or updated at or after `since`.
    async fn count_changed_since(&self, since: DateTime<Utc>) -> Result<u64, DomainError>;
}

/// Durable business roster keyed by `business_id`.
#[async_trait::async_trait]
pub trait BusinessStore: Send + Sync {
    async fn find_by_id(&self, business_id: &str) -> Result<Option<BusinessRecord>, DomainError>;

    /// Whole roster, highest score first.
    async fn list_by_score(&self) -> Result<Vec<BusinessRecord>, DomainError>;

    async fn insert(&self, record: &BusinessRecord) -> Result<(), DomainError>;

    /// Replaces the stored record with the same `business_id`.
    async fn update(&self, record: &BusinessRecord) -> Result<(), DomainError>;

    /// Removes a record. Only administrative merges delete roster entries.
    ///
    /// # Errors
    /// `DomainError::NotFound` if no record has this id.
    async fn delete(&self, business_id: &str) -> Result<(), DomainError>;
}

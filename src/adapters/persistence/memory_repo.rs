//! In-process store. Implements both store ports over `tokio::sync::RwLock`.
//!
//! Used by tests and by `ROSTER_STORAGE=memory` runs; nothing survives the process.

use crate::domain::{BusinessRecord, ComplaintRecord, ComplaintStatus, DomainError};
use crate::ports::{BusinessStore, ComplaintStore};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryRepo {
    complaints: RwLock<Vec<ComplaintRecord>>,
    businesses: RwLock<HashMap<String, BusinessRecord>>,
    fail_writes: AtomicBool,
    failing_ids: RwLock<HashSet<String>>,
    business_writes: AtomicUsize,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the complaint log.
    pub async fn with_complaints(complaints: Vec<ComplaintRecord>) -> Self {
        let repo = Self::new();
        *repo.complaints.write().await = complaints;
        repo
    }

    /// Makes every subsequent business insert/update fail with `DomainError::Repo`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes business writes for this one id fail; writes for other ids go through.
    pub async fn fail_on(&self, business_id: &str) {
        self.failing_ids.write().await.insert(business_id.to_string());
    }

    /// Drops every injected failure.
    pub async fn clear_failures(&self) {
        self.failing_ids.write().await.clear();
        self.set_fail_writes(false);
    }

    /// Number of successful business inserts, updates and deletes so far.
    pub fn business_writes(&self) -> usize {
        self.business_writes.load(Ordering::SeqCst)
    }

    async fn check_writable(&self, business_id: &str) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Repo("write rejected".into()));
        }
        if self.failing_ids.read().await.contains(business_id) {
            return Err(DomainError::Repo(format!("write rejected for {}", business_id)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ComplaintStore for MemoryRepo {
    async fn fetch_all(&self) -> Result<Vec<ComplaintRecord>, DomainError> {
        Ok(self.complaints.read().await.clone())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ComplaintRecord>, DomainError> {
        let complaints = self.complaints.read().await;
        let mut found: Vec<ComplaintRecord> = complaints
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert(&self, complaint: &ComplaintRecord) -> Result<(), DomainError> {
        self.complaints.write().await.push(complaint.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        status: ComplaintStatus,
        admin_message: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut complaints = self.complaints.write().await;
        let complaint = complaints
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("complaint {}", id)))?;
        complaint.status = status;
        if let Some(msg) = admin_message {
            complaint.admin_message = Some(msg.to_string());
        }
        complaint.updated_at = updated_at;
        Ok(())
    }

    async fn count_changed_since(&self, since: DateTime<Utc>) -> Result<u64, DomainError> {
        let complaints = self.complaints.read().await;
        Ok(complaints
            .iter()
            .filter(|c| c.created_at >= since || c.updated_at >= since)
            .count() as u64)
    }
}

#[async_trait::async_trait]
impl BusinessStore for MemoryRepo {
    async fn find_by_id(&self, business_id: &str) -> Result<Option<BusinessRecord>, DomainError> {
        Ok(self.businesses.read().await.get(business_id).cloned())
    }

    async fn list_by_score(&self) -> Result<Vec<BusinessRecord>, DomainError> {
        let mut all: Vec<BusinessRecord> = self.businesses.read().await.values().cloned().collect();
        all.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.business_id.cmp(&b.business_id))
        });
        Ok(all)
    }

    async fn insert(&self, record: &BusinessRecord) -> Result<(), DomainError> {
        self.check_writable(&record.business_id).await?;
        let mut businesses = self.businesses.write().await;
        if businesses.contains_key(&record.business_id) {
            return Err(DomainError::Repo(format!(
                "duplicate business_id {}",
                record.business_id
            )));
        }
        businesses.insert(record.business_id.clone(), record.clone());
        self.business_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, record: &BusinessRecord) -> Result<(), DomainError> {
        self.check_writable(&record.business_id).await?;
        let mut businesses = self.businesses.write().await;
        match businesses.get_mut(&record.business_id) {
            Some(existing) => *existing = record.clone(),
            None => return Err(DomainError::NotFound(format!("business {}", record.business_id))),
        }
        self.business_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, business_id: &str) -> Result<(), DomainError> {
        self.check_writable(business_id).await?;
        if self.businesses.write().await.remove(business_id).is_none() {
            return Err(DomainError::NotFound(format!("business {}", business_id)));
        }
        self.business_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

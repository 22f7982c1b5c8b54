//! Complaint intake: turn submissions into stored records and apply status transitions.
//!
//! The description header is parsed exactly once, here, at creation. Later edits never re-parse.

use crate::domain::intake::DEFAULT_CATEGORY;
use crate::domain::{ComplaintDraft, ComplaintRecord, ComplaintStatus, DomainError};
use crate::ports::ComplaintStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

pub struct IntakeService {
    complaints: Arc<dyn ComplaintStore>,
}

impl IntakeService {
    pub fn new(complaints: Arc<dyn ComplaintStore>) -> Self {
        Self { complaints }
    }

    /// Stores a new complaint as `pending`.
    pub async fn submit(&self, mut draft: ComplaintDraft) -> Result<ComplaintRecord, DomainError> {
        draft.apply_preamble();
        let now = Utc::now();
        let record = ComplaintRecord {
            id: uuid::Uuid::new_v4().to_string(),
            business_name: draft.business_name.filter(|n| !n.trim().is_empty()),
            status: ComplaintStatus::Pending,
            district: draft.district.filter(|d| !d.trim().is_empty()),
            neighborhood: draft.neighborhood.filter(|n| !n.trim().is_empty()),
            location: draft.location,
            description: draft.description,
            contact_email: draft.contact_email,
            category: draft
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            admin_message: None,
            created_at: now,
            updated_at: now,
        };
        if record.business_name.is_none() {
            warn!(complaint_id = %record.id, "complaint has no business name; it will not be scored");
        }
        self.complaints.insert(&record).await?;
        info!(complaint_id = %record.id, business = ?record.business_name, "complaint stored");
        Ok(record)
    }

    /// Submits drafts in order; stops at the first store error. Returns how many were stored.
    pub async fn submit_all(&self, drafts: Vec<ComplaintDraft>) -> Result<usize, DomainError> {
        let mut stored = 0usize;
        for draft in drafts {
            self.submit(draft).await?;
            stored += 1;
        }
        Ok(stored)
    }

    /// Moves a complaint to `status`; the next recompute picks the change up.
    pub async fn set_status(
        &self,
        id: &str,
        status: ComplaintStatus,
        admin_message: Option<&str>,
    ) -> Result<(), DomainError> {
        self.complaints
            .update_status(id, status, admin_message, Utc::now())
            .await?;
        info!(complaint_id = id, status = %status, "complaint status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::memory_repo::MemoryRepo;

    fn service() -> (Arc<MemoryRepo>, IntakeService) {
        let repo = Arc::new(MemoryRepo::new());
        let svc = IntakeService::new(Arc::clone(&repo) as Arc<dyn ComplaintStore>);
        (repo, svc)
    }

    #[tokio::test]
    async fn test_submit_parses_header_once() {
        let (repo, svc) = service();
        let draft = ComplaintDraft::new(
            "İşletme Adı: Baba Kebap\nİlçe: Konak\n\nÇiğ köfte bozuktu.",
            "a@example.com",
        );
        let record = svc.submit(draft).await.unwrap();

        assert_eq!(record.business_name.as_deref(), Some("Baba Kebap"));
        assert_eq!(record.district.as_deref(), Some("Konak"));
        assert_eq!(record.description, "Çiğ köfte bozuktu.");
        assert_eq!(record.status, ComplaintStatus::Pending);
        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert_eq!(repo.fetch_all().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_status_update_keeps_parsed_fields() {
        let (repo, svc) = service();
        let record = svc
            .submit(ComplaintDraft::new("İşletme Adı: Deniz\n\nİlçe: Bornova", "a@example.com"))
            .await
            .unwrap();
        // Header-looking body text stays in the description.
        assert_eq!(record.district, None);

        svc.set_status(&record.id, ComplaintStatus::InReview, Some("ekip yönlendirildi"))
            .await
            .unwrap();
        let stored = repo.fetch_all().await.unwrap().remove(0);
        assert_eq!(stored.status, ComplaintStatus::InReview);
        assert_eq!(stored.admin_message.as_deref(), Some("ekip yönlendirildi"));
        assert_eq!(stored.district, None);
        assert_eq!(stored.description, "İlçe: Bornova");
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_unknown_complaint_status_update() {
        let (_repo, svc) = service();
        let err = svc
            .set_status("missing", ComplaintStatus::Rejected, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_nameless_submission_is_stored() {
        let (repo, svc) = service();
        let stored = svc
            .submit_all(vec![
                ComplaintDraft::new("isim yok", "a@example.com"),
                ComplaintDraft::new("İşletme Adı: Öz Lokanta\n\nx", "b@example.com"),
            ])
            .await
            .unwrap();
        assert_eq!(stored, 2);
        let all = repo.fetch_all().await.unwrap();
        assert!(all[0].business_name.is_none());
        assert_eq!(all[1].business_name.as_deref(), Some("Öz Lokanta"));
    }
}

//! SQLite-backed stores via libsql. Implements ComplaintStore and BusinessStore.
//!
//! One database file (data/roster.db) holds both tables. Timestamps are Unix millis;
//! complaint id sets and audit notes are JSON text columns.

use crate::domain::{
    BusinessRecord, ComplaintRecord, ComplaintStatus, DomainError, Location, StatusCounts,
};
use crate::ports::{BusinessStore, ComplaintStore};
use chrono::{DateTime, Utc};
use libsql::{Database, Row, params};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{info, warn};

const COMPLAINTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS complaints (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    business_name TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    district TEXT,
    neighborhood TEXT,
    lat REAL,
    lng REAL,
    description TEXT NOT NULL DEFAULT '',
    contact_email TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT 'Diğer',
    admin_message TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)"#;
const COMPLAINTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_complaints_updated ON complaints (updated_at)";

const BUSINESSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS businesses (
    business_id TEXT PRIMARY KEY,
    business_name TEXT NOT NULL,
    district TEXT,
    neighborhood TEXT,
    lat REAL,
    lng REAL,
    business_address TEXT NOT NULL DEFAULT '',
    pending_complaints INTEGER NOT NULL DEFAULT 0,
    in_review_complaints INTEGER NOT NULL DEFAULT 0,
    positive_complaints INTEGER NOT NULL DEFAULT 0,
    negative_complaints INTEGER NOT NULL DEFAULT 0,
    complaint_ids_json TEXT NOT NULL DEFAULT '[]',
    score REAL NOT NULL DEFAULT 0,
    is_ready_for_inspection INTEGER NOT NULL DEFAULT 0,
    merged INTEGER NOT NULL DEFAULT 0,
    merged_count INTEGER NOT NULL DEFAULT 0,
    original_name TEXT,
    notes_json TEXT NOT NULL DEFAULT '[]',
    last_updated INTEGER NOT NULL
)"#;
const BUSINESSES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_businesses_score ON businesses (score DESC)";

const COMPLAINT_COLUMNS: &str = "id, business_name, status, district, neighborhood, lat, lng, \
     description, contact_email, category, admin_message, created_at, updated_at";

const BUSINESS_COLUMNS: &str = "business_id, business_name, district, neighborhood, lat, lng, \
     business_address, pending_complaints, in_review_complaints, positive_complaints, \
     negative_complaints, complaint_ids_json, score, is_ready_for_inspection, merged, \
     merged_count, original_name, notes_json, last_updated";

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DomainError::Repo(format!("timestamp out of range: {}", ms)))
}

/// SQLite repository. Safe to share via Arc; writes are serialized because SQLite has one writer.
pub struct SqliteRepo {
    db: Database,
    write_lock: Mutex<()>,
}

impl SqliteRepo {
    /// Connect to (or create) `roster.db` under `base_dir` and ensure the schema exists.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join("roster.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // PRAGMA returns a row; consume it (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
            while rows.next().await.map_err(repo_err)?.is_some() {}
        }

        for ddl in [
            COMPLAINTS_TABLE,
            COMPLAINTS_INDEX,
            BUSINESSES_TABLE,
            BUSINESSES_INDEX,
        ] {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn connection(&self) -> Result<libsql::Connection, DomainError> {
        self.db.connect().map_err(repo_err)
    }

    /// Returns `None` for rows whose status string is not one we know.
    fn row_to_complaint(row: &Row) -> Result<Option<ComplaintRecord>, DomainError> {
        let id: String = row.get(0).map_err(repo_err)?;
        let status_raw: String = row.get(2).map_err(repo_err)?;
        let status = match status_raw.parse::<ComplaintStatus>() {
            Ok(s) => s,
            Err(e) => {
                warn!(complaint_id = %id, error = %e, "skipping complaint with unknown status");
                return Ok(None);
            }
        };
        Ok(Some(ComplaintRecord {
            id,
            business_name: row.get::<String>(1).ok(),
            status,
            district: row.get::<String>(3).ok(),
            neighborhood: row.get::<String>(4).ok(),
            location: Location::from_parts(row.get::<f64>(5).ok(), row.get::<f64>(6).ok()),
            description: row.get::<String>(7).unwrap_or_default(),
            contact_email: row.get::<String>(8).unwrap_or_default(),
            category: row.get::<String>(9).unwrap_or_default(),
            admin_message: row.get::<String>(10).ok(),
            created_at: from_millis(row.get(11).map_err(repo_err)?)?,
            updated_at: from_millis(row.get(12).map_err(repo_err)?)?,
        }))
    }

    fn row_to_business(row: &Row) -> Result<BusinessRecord, DomainError> {
        let count = |i: i32| -> Result<u32, DomainError> {
            let v: i64 = row.get(i).map_err(repo_err)?;
            u32::try_from(v).map_err(repo_err)
        };
        let ids_json: String = row.get(11).map_err(repo_err)?;
        let notes_json: String = row.get(17).map_err(repo_err)?;
        let complaint_ids: BTreeSet<String> = serde_json::from_str(&ids_json).map_err(repo_err)?;
        let notes: Vec<String> = serde_json::from_str(&notes_json).map_err(repo_err)?;

        Ok(BusinessRecord {
            business_id: row.get(0).map_err(repo_err)?,
            business_name: row.get(1).map_err(repo_err)?,
            district: row.get::<String>(2).ok(),
            neighborhood: row.get::<String>(3).ok(),
            location: Location::from_parts(row.get::<f64>(4).ok(), row.get::<f64>(5).ok()),
            business_address: row.get::<String>(6).unwrap_or_default(),
            counts: StatusCounts {
                pending: count(7)?,
                in_review: count(8)?,
                positive: count(9)?,
                negative: count(10)?,
            },
            complaint_ids,
            score: row.get(12).map_err(repo_err)?,
            is_ready_for_inspection: row.get::<i64>(13).map_err(repo_err)? != 0,
            merged: row.get::<i64>(14).map_err(repo_err)? != 0,
            merged_count: count(15)?,
            original_name: row.get::<String>(16).ok(),
            notes,
            last_updated: from_millis(row.get(18).map_err(repo_err)?)?,
        })
    }

    async fn query_complaints(&self, sql: &str) -> Result<Vec<ComplaintRecord>, DomainError> {
        let conn = self.connection()?;
        let mut rows = conn.query(sql, ()).await.map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            if let Some(c) = Self::row_to_complaint(&row)? {
                out.push(c);
            }
        }
        Ok(out)
    }

    async fn write_business(&self, sql: &str, record: &BusinessRecord) -> Result<u64, DomainError> {
        let ids_json = serde_json::to_string(&record.complaint_ids).map_err(repo_err)?;
        let notes_json = serde_json::to_string(&record.notes).map_err(repo_err)?;
        let _guard = self.write_lock.lock().await;
        let conn = self.connection()?;
        conn.execute(
            sql,
            params![
                record.business_id.as_str(),
                record.business_name.as_str(),
                record.district.as_deref(),
                record.neighborhood.as_deref(),
                record.location.map(|l| l.lat),
                record.location.map(|l| l.lng),
                record.business_address.as_str(),
                i64::from(record.counts.pending),
                i64::from(record.counts.in_review),
                i64::from(record.counts.positive),
                i64::from(record.counts.negative),
                ids_json,
                record.score,
                i64::from(record.is_ready_for_inspection),
                i64::from(record.merged),
                i64::from(record.merged_count),
                record.original_name.as_deref(),
                notes_json,
                to_millis(record.last_updated)
            ],
        )
        .await
        .map_err(repo_err)
    }
}

#[async_trait::async_trait]
impl ComplaintStore for SqliteRepo {
    async fn fetch_all(&self) -> Result<Vec<ComplaintRecord>, DomainError> {
        let sql = format!("SELECT {} FROM complaints ORDER BY seq ASC", COMPLAINT_COLUMNS);
        self.query_complaints(&sql).await
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ComplaintRecord>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let sql = format!(
            "SELECT {} FROM complaints ORDER BY created_at DESC",
            COMPLAINT_COLUMNS
        );
        let all = self.query_complaints(&sql).await?;
        Ok(all
            .into_iter()
            .filter(|c| wanted.contains(c.id.as_str()))
            .collect())
    }

    async fn insert(&self, c: &ComplaintRecord) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.connection()?;
        conn.execute(
            &format!(
                "INSERT INTO complaints ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                COMPLAINT_COLUMNS
            ),
            params![
                c.id.as_str(),
                c.business_name.as_deref(),
                c.status.as_str(),
                c.district.as_deref(),
                c.neighborhood.as_deref(),
                c.location.map(|l| l.lat),
                c.location.map(|l| l.lng),
                c.description.as_str(),
                c.contact_email.as_str(),
                c.category.as_str(),
                c.admin_message.as_deref(),
                to_millis(c.created_at),
                to_millis(c.updated_at)
            ],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        status: ComplaintStatus,
        admin_message: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.connection()?;
        let changed = conn
            .execute(
                r#"
                UPDATE complaints
                SET status = ?2, admin_message = COALESCE(?3, admin_message), updated_at = ?4
                WHERE id = ?1
                "#,
                params![id, status.as_str(), admin_message, to_millis(updated_at)],
            )
            .await
            .map_err(repo_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("complaint {}", id)));
        }
        Ok(())
    }

    async fn count_changed_since(&self, since: DateTime<Utc>) -> Result<u64, DomainError> {
        let conn = self.connection()?;
        let ms = to_millis(since);
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM complaints WHERE created_at >= ?1 OR updated_at >= ?1",
                params![ms],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => {
                let n: i64 = row.get(0).map_err(repo_err)?;
                Ok(n.max(0) as u64)
            }
            None => Ok(0),
        }
    }
}

#[async_trait::async_trait]
impl BusinessStore for SqliteRepo {
    async fn find_by_id(&self, business_id: &str) -> Result<Option<BusinessRecord>, DomainError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM businesses WHERE business_id = ?1",
                    BUSINESS_COLUMNS
                ),
                params![business_id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::row_to_business(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_score(&self) -> Result<Vec<BusinessRecord>, DomainError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM businesses ORDER BY score DESC, business_id ASC",
                    BUSINESS_COLUMNS
                ),
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(Self::row_to_business(&row)?);
        }
        Ok(out)
    }

    async fn insert(&self, record: &BusinessRecord) -> Result<(), DomainError> {
        let sql = format!(
            "INSERT INTO businesses ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            BUSINESS_COLUMNS
        );
        self.write_business(&sql, record).await?;
        Ok(())
    }

    async fn update(&self, record: &BusinessRecord) -> Result<(), DomainError> {
        let sql = r#"
            UPDATE businesses SET
                business_name = ?2, district = ?3, neighborhood = ?4, lat = ?5, lng = ?6,
                business_address = ?7, pending_complaints = ?8, in_review_complaints = ?9,
                positive_complaints = ?10, negative_complaints = ?11, complaint_ids_json = ?12,
                score = ?13, is_ready_for_inspection = ?14, merged = ?15, merged_count = ?16,
                original_name = ?17, notes_json = ?18, last_updated = ?19
            WHERE business_id = ?1
        "#;
        let changed = self.write_business(sql, record).await?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!(
                "business {}",
                record.business_id
            )));
        }
        Ok(())
    }

    async fn delete(&self, business_id: &str) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "DELETE FROM businesses WHERE business_id = ?1",
                params![business_id],
            )
            .await
            .map_err(repo_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("business {}", business_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn temp_repo() -> SqliteRepo {
        let dir = std::env::temp_dir().join(format!("roster-test-{}", uuid::Uuid::new_v4()));
        SqliteRepo::connect(&dir).await.unwrap()
    }

    fn complaint(id: &str, created_at: DateTime<Utc>) -> ComplaintRecord {
        ComplaintRecord {
            id: id.to_string(),
            business_name: Some("Baba Kebap".to_string()),
            status: ComplaintStatus::Pending,
            district: Some("Konak".to_string()),
            neighborhood: None,
            location: Some(Location { lat: 38.42, lng: 27.13 }),
            description: "Kirli mutfak".to_string(),
            contact_email: "a@example.com".to_string(),
            category: "Hijyen".to_string(),
            admin_message: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_complaints_round_trip() {
        let repo = temp_repo().await;
        let t0 = DateTime::<Utc>::from_timestamp_millis(1_714_550_400_000).unwrap();
        ComplaintStore::insert(&repo, &complaint("c1", t0)).await.unwrap();
        ComplaintStore::insert(&repo, &complaint("c2", t0 + Duration::hours(2)))
            .await
            .unwrap();

        let all = repo.fetch_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], complaint("c1", t0));

        let newest_first = repo
            .fetch_by_ids(&["c1".to_string(), "c2".to_string()])
            .await
            .unwrap();
        assert_eq!(newest_first[0].id, "c2");

        repo.update_status("c1", ComplaintStatus::InReview, Some("inceleniyor"), t0 + Duration::hours(3))
            .await
            .unwrap();
        assert_eq!(repo.count_changed_since(t0 + Duration::hours(1)).await.unwrap(), 2);
        assert!(matches!(
            repo.update_status("nope", ComplaintStatus::Negative, None, t0).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_businesses_round_trip() {
        let repo = temp_repo().await;
        let now = DateTime::<Utc>::from_timestamp_millis(1_714_550_400_000).unwrap();
        let mut record = BusinessRecord {
            business_id: "baba kebap_konak".to_string(),
            business_name: "Baba Kebap (Baba Kebab)".to_string(),
            district: Some("Konak".to_string()),
            neighborhood: None,
            location: None,
            business_address: "Konak".to_string(),
            counts: StatusCounts { pending: 2, in_review: 1, positive: 0, negative: 3 },
            complaint_ids: ["c1", "c2"].iter().map(|s| s.to_string()).collect(),
            score: 10.5,
            is_ready_for_inspection: false,
            merged: true,
            merged_count: 2,
            original_name: Some("Baba Kebap".to_string()),
            notes: vec!["merged".to_string()],
            last_updated: now,
        };
        BusinessStore::insert(&repo, &record).await.unwrap();
        assert_eq!(repo.find_by_id("baba kebap_konak").await.unwrap(), Some(record.clone()));

        record.score = 12.0;
        BusinessStore::update(&repo, &record).await.unwrap();
        let listed = repo.list_by_score().await.unwrap();
        assert_eq!(listed, vec![record]);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());

        repo.delete("baba kebap_konak").await.unwrap();
        assert!(repo.list_by_score().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete("baba kebap_konak").await,
            Err(DomainError::NotFound(_))
        ));
    }
}

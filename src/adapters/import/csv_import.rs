//! CSV complaint import. Uses the `csv` crate with serde row mapping.
//!
//! Expected header: `description,contact_email,category,business_name,district,neighborhood,lat,lng`.
//! Only `description` is required; empty cells become `None`.

use crate::domain::{ComplaintDraft, DomainError, Location};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CsvRow {
    description: String,
    #[serde(default)]
    contact_email: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    business_name: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    neighborhood: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl From<CsvRow> for ComplaintDraft {
    fn from(row: CsvRow) -> Self {
        let mut draft = ComplaintDraft::new(row.description, row.contact_email.unwrap_or_default());
        draft.category = non_empty(row.category);
        draft.business_name = non_empty(row.business_name);
        draft.district = non_empty(row.district);
        draft.neighborhood = non_empty(row.neighborhood);
        draft.location = Location::from_parts(row.lat, row.lng);
        draft
    }
}

/// Parses complaint drafts from any reader. Rows are returned in file order.
///
/// # Errors
/// Returns `DomainError::Import` with the 1-based record number on the first malformed row.
pub fn parse_complaints_csv<R: Read>(reader: R) -> Result<Vec<ComplaintDraft>, DomainError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut drafts = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| DomainError::Import(format!("row {}: {}", i + 1, e)))?;
        drafts.push(ComplaintDraft::from(row));
    }
    Ok(drafts)
}

/// Reads complaint drafts from a CSV file on disk.
pub fn read_complaints_csv(path: impl AsRef<Path>) -> Result<Vec<ComplaintDraft>, DomainError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| DomainError::Import(format!("open {}: {}", path.display(), e)))?;
    let drafts = parse_complaints_csv(file)?;
    info!(path = %path.display(), rows = drafts.len(), "complaints CSV parsed");
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complaints_csv() {
        let data = "\
description,contact_email,category,business_name,district,neighborhood,lat,lng
Kirli masalar,a@example.com,Hijyen,Baba Kebap,Konak,Alsancak,38.4361,27.1428
\"İşletme Adı: Deniz\n\nBalık bayattı\",b@example.com,,,,,,
Tek koordinat,c@example.com,,Öz Lokanta,Bornova,,38.46,
";
        let drafts = parse_complaints_csv(data.as_bytes()).unwrap();
        assert_eq!(drafts.len(), 3);

        assert_eq!(drafts[0].business_name.as_deref(), Some("Baba Kebap"));
        assert_eq!(drafts[0].category.as_deref(), Some("Hijyen"));
        assert_eq!(drafts[0].location, Some(Location { lat: 38.4361, lng: 27.1428 }));

        // Header parsing is left to intake.
        assert!(drafts[1].business_name.is_none());
        assert!(drafts[1].description.starts_with("İşletme Adı: Deniz"));
        assert!(!drafts[1].preamble_applied());

        assert!(drafts[2].location.is_none());
        assert!(drafts[2].neighborhood.is_none());
    }

    #[test]
    fn test_malformed_row_reports_position() {
        let data = "description,lat,lng\nok,1.0,2.0\nbad,north,2.0\n";
        let err = parse_complaints_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, DomainError::Import(ref m) if m.starts_with("row 2")));
    }
}

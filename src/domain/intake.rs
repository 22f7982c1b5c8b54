//! Complaint submissions before they become records.
//!
//! Citizens often paste a structured header into the free-text description:
//!
//! ```text
//! İşletme Adı: Baba Kebap
//! İlçe: Konak
//! Mahalle: Alsancak
//! Konum: 38.4361, 27.1428
//!
//! Actual complaint text...
//! ```
//!
//! The header is lifted into structured fields once, when the complaint is created.

use crate::domain::Location;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const NAME_LABEL: &str = "İşletme Adı:";
const DISTRICT_LABEL: &str = "İlçe:";
const NEIGHBORHOOD_LABEL: &str = "Mahalle:";
const LOCATION_LABEL: &str = "Konum:";

pub const DEFAULT_CATEGORY: &str = "Diğer";

/// Leading decimal number of a coordinate part; trailing text is ignored.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("leading number pattern")
});

/// A complaint as submitted, not yet stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintDraft {
    pub description: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(skip)]
    preamble_applied: bool,
}

impl ComplaintDraft {
    pub fn new(description: impl Into<String>, contact_email: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            contact_email: contact_email.into(),
            ..Self::default()
        }
    }

    pub fn preamble_applied(&self) -> bool {
        self.preamble_applied
    }

    /// Lifts the structured header out of the description. A second call is a no-op.
    ///
    /// Header lines are read until the first blank line after line one; the description
    /// is then replaced by whatever follows that blank line.
    pub fn apply_preamble(&mut self) {
        if self.preamble_applied {
            return;
        }
        self.preamble_applied = true;

        let lines: Vec<&str> = self.description.split('\n').collect();
        let mut body_start = 0usize;

        for (i, line) in lines.iter().enumerate() {
            if let Some(rest) = line.strip_prefix(NAME_LABEL) {
                self.business_name = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix(DISTRICT_LABEL) {
                self.district = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix(NEIGHBORHOOD_LABEL) {
                self.neighborhood = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix(LOCATION_LABEL) {
                if let Some(loc) = parse_coordinates(rest) {
                    self.location = Some(loc);
                }
            }

            if line.is_empty() && i > 0 {
                body_start = i + 1;
                break;
            }
        }

        if body_start > 0 && body_start < lines.len() {
            self.description = lines[body_start..].join("\n");
        }
    }
}

/// Parses `"<lat>, <lng>"` leniently: only the first two comma parts count, and each
/// part contributes its leading number (`"38.1abc"` reads as `38.1`).
fn parse_coordinates(text: &str) -> Option<Location> {
    let mut parts = text.split(',');
    let lat = leading_number(parts.next()?)?;
    let lng = leading_number(parts.next()?)?;
    Some(Location { lat, lng })
}

fn leading_number(part: &str) -> Option<f64> {
    let m = LEADING_NUMBER.find(part.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION: &str = "İşletme Adı: Baba Kebap\nİlçe: Konak\nMahalle: Alsancak\nKonum: 38.4361, 27.1428\n\nMasalar çok kirliydi.\nPersonel eldiven takmıyordu.";

    #[test]
    fn test_preamble_is_lifted() {
        let mut draft = ComplaintDraft::new(SUBMISSION, "a@example.com");
        draft.apply_preamble();
        assert_eq!(draft.business_name.as_deref(), Some("Baba Kebap"));
        assert_eq!(draft.district.as_deref(), Some("Konak"));
        assert_eq!(draft.neighborhood.as_deref(), Some("Alsancak"));
        assert_eq!(draft.location, Some(Location { lat: 38.4361, lng: 27.1428 }));
        assert_eq!(
            draft.description,
            "Masalar çok kirliydi.\nPersonel eldiven takmıyordu."
        );
    }

    #[test]
    fn test_second_application_is_noop() {
        let mut draft = ComplaintDraft::new(SUBMISSION, "a@example.com");
        draft.apply_preamble();
        let once = draft.clone();
        // A body line that looks like a header must not be re-parsed.
        draft.description = "İlçe: Bornova\n\nbody".to_string();
        draft.apply_preamble();
        assert_eq!(draft.district, once.district);
        assert_eq!(draft.description, "İlçe: Bornova\n\nbody");
    }

    #[test]
    fn test_plain_description_untouched() {
        let mut draft = ComplaintDraft::new("Yemekte saç çıktı.", "a@example.com");
        draft.business_name = Some("Deniz Balık".to_string());
        draft.apply_preamble();
        assert_eq!(draft.description, "Yemekte saç çıktı.");
        assert_eq!(draft.business_name.as_deref(), Some("Deniz Balık"));
        assert!(draft.preamble_applied());
    }

    #[test]
    fn test_bad_coordinates_ignored() {
        let mut draft = ComplaintDraft::new("Konum: kuzey tarafı\n\nx", "a@example.com");
        draft.apply_preamble();
        assert!(draft.location.is_none());
        assert_eq!(parse_coordinates(" 38.1,27.2 "), Some(Location { lat: 38.1, lng: 27.2 }));
    }

    #[test]
    fn test_coordinates_read_leading_numbers() {
        assert_eq!(
            parse_coordinates("38.1, 27.2, 5"),
            Some(Location { lat: 38.1, lng: 27.2 })
        );
        assert_eq!(
            parse_coordinates("38.1abc,27"),
            Some(Location { lat: 38.1, lng: 27.0 })
        );
        assert_eq!(
            parse_coordinates("-12.5e0 ,  +.5"),
            Some(Location { lat: -12.5, lng: 0.5 })
        );
        assert_eq!(parse_coordinates("38.1"), None);
        assert_eq!(parse_coordinates("abc, 27"), None);
    }
}

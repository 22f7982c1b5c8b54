//! Text canonicalization and identity keys.
//!
//! Both functions are total: missing input contributes nothing, nothing here can fail.

use crate::domain::Location;
use regex::Regex;
use std::sync::LazyLock;

/// Generic venue-type words that say nothing about which business it is.
/// Alternation order matters: the first alternative that matches at a position wins.
static VENUE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("restaurant|restoran|restorant|lokanta|cafe|kafe|kafeterya")
        .expect("venue word pattern")
});

static SHOP_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("market|supermarket").expect("shop word pattern"));

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("non-alnum pattern"));

fn fold_char(c: char) -> char {
    match c {
        'ı' => 'i',
        'ğ' => 'g',
        'ü' => 'u',
        'ş' => 's',
        'ö' => 'o',
        'ç' => 'c',
        'â' => 'a',
        'î' => 'i',
        'û' => 'u',
        other => other,
    }
}

/// Canonical comparison form of free text.
///
/// Lowercases (dotted capital I becomes a plain `i`), folds Turkish letters to ASCII,
/// drops venue-type words, turns every other non-`[a-z0-9]` run into a single space and trims.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let folded: String = text
        .chars()
        .flat_map(|c| {
            let c = if c == 'İ' { 'i' } else { c };
            c.to_lowercase()
        })
        .map(fold_char)
        .collect();

    let without_venue = VENUE_WORDS.replace_all(&folded, "");
    let without_shop = SHOP_WORDS.replace_all(&without_venue, "");
    NON_ALNUM
        .replace_all(&without_shop, " ")
        .trim()
        .to_string()
}

/// Rounds to 3 decimal places (roughly a 111 m bucket).
///
/// Halves round toward positive infinity and `-0.0` collapses to `0.0`, so a key only
/// depends on the rounded value: `-0.0625` gives `-0.062`, `-0.0004` gives `0`.
fn round3(value: f64) -> f64 {
    ((value * 1000.0) + 0.5).floor() / 1000.0 + 0.0
}

/// A blank string counts as absent.
pub(crate) fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.trim().is_empty())
}

/// Coarse composite identity for a business mention.
///
/// Two mentions collide iff every present field normalizes (or rounds) identically.
/// A missing field is not a wildcard: `name_district` never equals `name_district_hood`.
pub fn build_id(
    name: &str,
    district: Option<&str>,
    neighborhood: Option<&str>,
    location: Option<&Location>,
) -> String {
    let mut id = normalize(name);

    if let Some(district) = present(district) {
        id.push('_');
        id.push_str(&normalize(district));
    }

    if let Some(neighborhood) = present(neighborhood) {
        id.push('_');
        id.push_str(&normalize(neighborhood));
    }

    if let Some(loc) = location {
        id.push_str(&format!("_{}_{}", round3(loc.lat), round3(loc.lng)));
    }

    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_turkish_letters() {
        assert_eq!(normalize("Şiş Köfteci Ömür"), "sis kofteci omur");
        assert_eq!(normalize("ĞÜÇ"), "guc");
    }

    #[test]
    fn test_normalize_strips_venue_words_and_punctuation() {
        assert_eq!(normalize("Lezzet Restoran!"), "lezzet");
        assert_eq!(normalize("Mavi-Kafe & Bar"), "mavi bar");
        assert_eq!(normalize("  Öz   Süpermarket  "), "oz");
        assert_eq!(normalize("Kafeterya Nur"), "terya nur");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_build_id_is_deterministic_across_spellings() {
        let a = build_id("İzmir Cafe", Some("Konak"), None, None);
        let b = build_id("izmir kafe", Some("konak"), None, None);
        assert_eq!(a, b);
        assert_eq!(a, "izmir_konak");
    }

    #[test]
    fn test_build_id_missing_field_is_not_wildcard() {
        let without = build_id("Baba Kebap", Some("Konak"), None, None);
        let with = build_id("Baba Kebap", Some("Konak"), Some("Alsancak"), None);
        assert_ne!(without, with);
        assert_eq!(with, "baba kebap_konak_alsancak");
    }

    #[test]
    fn test_build_id_rounds_coordinates() {
        let near = Location { lat: 38.41961, lng: 27.12872 };
        let nearer = Location { lat: 38.4204, lng: 27.1291 };
        let a = build_id("Baba Kebap", None, None, Some(&near));
        let b = build_id("Baba Kebap", None, None, Some(&nearer));
        assert_eq!(a, "baba kebap_38.42_27.129");
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_id_blank_district_is_absent() {
        assert_eq!(build_id("Baba", Some("  "), None, None), "baba");
    }

    #[test]
    fn test_build_id_signed_zero_collapses() {
        let south = Location { lat: -0.0004, lng: 27.0 };
        let north = Location { lat: 0.0004, lng: 27.0 };
        let a = build_id("Baba", None, None, Some(&south));
        assert_eq!(a, "baba_0_27");
        assert_eq!(a, build_id("Baba", None, None, Some(&north)));
    }

    #[test]
    fn test_build_id_negative_half_rounds_up() {
        let west = Location { lat: 38.0, lng: -0.0625 };
        assert_eq!(build_id("Baba", None, None, Some(&west)), "baba_38_-0.062");
        assert_eq!(round3(0.0625), 0.063);
    }
}

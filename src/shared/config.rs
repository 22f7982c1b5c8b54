//! Application configuration. Storage paths and refresh timings.

use serde::Deserialize;

/// Default age (hours) after which `analyze()` recomputes the roster.
pub const DEFAULT_STALENESS_HOURS: i64 = crate::usecases::roster_service::DEFAULT_STALENESS_HOURS;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding roster.db. Read from ROSTER_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// `sqlite` (default) or `memory`. Read from ROSTER_STORAGE.
    #[serde(default)]
    pub storage: Option<String>,

    /// Roster age in hours that triggers a lazy recompute (default 6). Read from ROSTER_STALENESS_HOURS.
    #[serde(default)]
    pub staleness_hours: Option<String>,

    /// Scheduler sleep between checks in seconds (default 3600). Read from ROSTER_CHECK_INTERVAL_SECS.
    #[serde(default)]
    pub check_interval_secs: Option<String>,

    /// Trailing window in seconds for "recent complaint changes" (default 3600). Read from ROSTER_RECENT_WINDOW_SECS.
    #[serde(default)]
    pub recent_window_secs: Option<String>,

    /// CSV file offered by the import menu entry. Read from ROSTER_IMPORT_PATH.
    #[serde(default)]
    pub import_path: Option<String>,
}

/// Numeric settings are kept as text and parsed on use, so one bad value only resets itself.
fn parse_setting<T: std::str::FromStr>(raw: Option<&String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse::<T>().ok())
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("ROSTER"));
        if let Ok(path) = std::env::var("ROSTER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// True when the in-memory store was requested.
    pub fn use_memory_storage(&self) -> bool {
        self.storage
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("memory"))
    }

    /// Returns staleness threshold in hours. Defaults to 6 if unset or not positive.
    pub fn staleness_hours_or_default(&self) -> i64 {
        parse_setting::<i64>(self.staleness_hours.as_ref())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_STALENESS_HOURS)
    }

    /// Returns scheduler check interval in seconds. Defaults to 3600.
    pub fn check_interval_secs_or_default(&self) -> u64 {
        parse_setting::<u64>(self.check_interval_secs.as_ref())
            .filter(|s| *s > 0)
            .unwrap_or(3600)
    }

    /// Returns the recent-change window in seconds. Defaults to 3600.
    pub fn recent_window_secs_or_default(&self) -> u64 {
        parse_setting::<u64>(self.recent_window_secs.as_ref()).unwrap_or(3600)
    }

    pub fn import_path_or_default(&self) -> String {
        self.import_path
            .clone()
            .unwrap_or_else(|| "./complaints.csv".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.staleness_hours_or_default(), 6);
        assert_eq!(cfg.check_interval_secs_or_default(), 3600);
        assert_eq!(cfg.recent_window_secs_or_default(), 3600);
        assert_eq!(cfg.data_dir_or_default(), "./data");
        assert!(!cfg.use_memory_storage());
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let cfg = AppConfig {
            staleness_hours: Some("0".to_string()),
            check_interval_secs: Some("0".to_string()),
            storage: Some("Memory".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.staleness_hours_or_default(), 6);
        assert_eq!(cfg.check_interval_secs_or_default(), 3600);
        assert!(cfg.use_memory_storage());
    }

    #[test]
    fn test_bad_number_only_resets_itself() {
        let cfg = AppConfig {
            staleness_hours: Some("6h".to_string()),
            recent_window_secs: Some(" 900 ".to_string()),
            storage: Some("memory".to_string()),
            data_dir: Some("/var/lib/roster".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.staleness_hours_or_default(), 6);
        assert_eq!(cfg.recent_window_secs_or_default(), 900);
        assert!(cfg.use_memory_storage());
        assert_eq!(cfg.data_dir_or_default(), "/var/lib/roster");
    }

    #[test]
    fn test_numbers_deserialize_from_text() {
        let cfg: AppConfig = config::Config::builder()
            .set_override("staleness_hours", "12h")
            .unwrap()
            .set_override("check_interval_secs", "60")
            .unwrap()
            .set_override("storage", "memory")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.staleness_hours_or_default(), 6);
        assert_eq!(cfg.check_interval_secs_or_default(), 60);
        assert!(cfg.use_memory_storage());
    }
}

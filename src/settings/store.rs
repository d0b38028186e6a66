use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

pub const DEFAULT_WORK_MINUTES: i64 = 30;
pub const DEFAULT_BREAK_MINUTES: i64 = 5;
/// Upper bound for either duration: one day.
pub const MAX_MINUTES: i64 = 24 * 60;
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// The persisted record shared by the timer and the settings surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub work_minutes: i64,
    pub break_minutes: i64,
    pub auto_launch_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_break_timestamp: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            auto_launch_enabled: true,
            next_break_timestamp: None,
        }
    }
}

impl Settings {
    pub fn work_ms(&self) -> i64 {
        self.work_minutes.saturating_mul(60_000)
    }

    pub fn break_ms(&self) -> i64 {
        self.break_minutes.saturating_mul(60_000)
    }
}

/// Fields a client may change. The next break time is derived, never written by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_launch_enabled: Option<bool>,
}

impl SettingsPatch {
    fn validate(&self) -> AppResult<()> {
        if let Some(work) = self.work_minutes {
            check_minutes("workMinutes", work)?;
        }
        if let Some(brk) = self.break_minutes {
            check_minutes("breakMinutes", brk)?;
        }
        Ok(())
    }

    fn apply_to(&self, settings: &Settings) -> Settings {
        let mut next = settings.clone();
        if let Some(work) = self.work_minutes {
            next.work_minutes = work;
        }
        if let Some(brk) = self.break_minutes {
            next.break_minutes = brk;
        }
        if let Some(auto) = self.auto_launch_enabled {
            next.auto_launch_enabled = auto;
        }
        next
    }
}

fn check_minutes(field: &str, value: i64) -> AppResult<()> {
    if value <= 0 {
        return Err(AppError::InvalidSettings(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    if value > MAX_MINUTES {
        return Err(AppError::InvalidSettings(format!(
            "{} must be at most {}, got {}",
            field, MAX_MINUTES, value
        )));
    }
    Ok(())
}

/// Where the settings record lives between runs.
pub trait SettingsBackend: Send {
    /// `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> AppResult<Option<Settings>>;
    fn save(&self, settings: &Settings) -> AppResult<()>;
}

pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(SETTINGS_FILE_NAME),
        }
    }
}

impl SettingsBackend for JsonFileBackend {
    fn load(&self) -> AppResult<Option<Settings>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::StorageUnavailable(e.to_string())),
        };
        if data.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| AppError::StorageUnavailable(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, settings: &Settings) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        // Write-then-rename: readers never observe a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}

pub struct SettingsStore {
    current: Settings,
    backend: Box<dyn SettingsBackend>,
}

impl SettingsStore {
    /// Loads the stored record, falling back to defaults when it is missing or unreadable.
    pub fn open(backend: Box<dyn SettingsBackend>) -> Self {
        let current = match backend.load() {
            Ok(Some(settings)) => sanitize(settings),
            Ok(None) => {
                debug!("no stored settings, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!("{}; falling back to default settings", e);
                Settings::default()
            }
        };
        Self { current, backend }
    }

    pub fn get(&self) -> Settings {
        self.current.clone()
    }

    /// Validates and persists `patch`. The in-memory record only changes once the write succeeded.
    pub fn update(&mut self, patch: &SettingsPatch) -> AppResult<Settings> {
        patch.validate()?;
        let next = patch.apply_to(&self.current);
        self.backend.save(&next)?;
        self.current = next;
        Ok(self.current.clone())
    }

    pub fn record_next_break(&mut self, timestamp_ms: i64) {
        self.current.next_break_timestamp = Some(timestamp_ms);
        if let Err(e) = self.backend.save(&self.current) {
            warn!("could not persist next break time: {}", e);
        }
    }
}

// Stored files may predate validation or have been edited by hand.
fn sanitize(mut settings: Settings) -> Settings {
    let defaults = Settings::default();
    if let Err(e) = check_minutes("workMinutes", settings.work_minutes) {
        warn!("stored {}, using {}", e, defaults.work_minutes);
        settings.work_minutes = defaults.work_minutes;
    }
    if let Err(e) = check_minutes("breakMinutes", settings.break_minutes) {
        warn!("stored {}, using {}", e, defaults.break_minutes);
        settings.break_minutes = defaults.break_minutes;
    }
    settings
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory backend whose contents stay observable after the store takes ownership.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryBackend {
        pub saved: Arc<Mutex<Option<Settings>>>,
        pub fail_writes: Arc<Mutex<bool>>,
    }

    impl SettingsBackend for MemoryBackend {
        fn load(&self) -> AppResult<Option<Settings>> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save(&self, settings: &Settings) -> AppResult<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(AppError::StorageUnavailable("disk full".to_string()));
            }
            *self.saved.lock().unwrap() = Some(settings.clone());
            Ok(())
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let store = SettingsStore::open(Box::new(MemoryBackend::default()));
        let settings = store.get();
        assert_eq!(settings.work_minutes, 30);
        assert_eq!(settings.break_minutes, 5);
        assert!(settings.auto_launch_enabled);
        assert_eq!(settings.next_break_timestamp, None);
    }

    #[test]
    fn test_update_persists_before_returning() {
        let backend = MemoryBackend::default();
        let mut store = SettingsStore::open(Box::new(backend.clone()));
        let patch = SettingsPatch {
            work_minutes: Some(45),
            auto_launch_enabled: Some(false),
            ..Default::default()
        };
        let updated = store.update(&patch).unwrap();

        assert_eq!(updated.work_minutes, 45);
        assert_eq!(updated.break_minutes, 5);
        assert!(!updated.auto_launch_enabled);
        assert_eq!(store.get(), updated);
        assert_eq!(backend.saved.lock().unwrap().clone(), Some(updated));
    }

    #[test]
    fn test_rejects_non_positive_durations() {
        let backend = MemoryBackend::default();
        let mut store = SettingsStore::open(Box::new(backend.clone()));
        let before = store.get();

        let err = store
            .update(&SettingsPatch {
                work_minutes: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSettings(_)));

        let err = store
            .update(&SettingsPatch {
                break_minutes: Some(-3),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("breakMinutes"));

        assert_eq!(store.get(), before);
        assert!(backend.saved.lock().unwrap().is_none());
    }

    #[test]
    fn test_rejects_durations_beyond_a_day() {
        let backend = MemoryBackend::default();
        let mut store = SettingsStore::open(Box::new(backend.clone()));
        let before = store.get();

        let err = store
            .update(&SettingsPatch {
                work_minutes: Some(1_000_000_000_000_000),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSettings(_)));
        assert!(err.to_string().contains("at most"));

        let err = store
            .update(&SettingsPatch {
                break_minutes: Some(MAX_MINUTES + 1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSettings(_)));

        assert_eq!(store.get(), before);
        assert!(backend.saved.lock().unwrap().is_none());

        let updated = store
            .update(&SettingsPatch {
                work_minutes: Some(MAX_MINUTES),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.work_ms(), MAX_MINUTES * 60_000);
    }

    #[test]
    fn test_oversized_stored_duration_replaced_by_default() {
        let backend = MemoryBackend::default();
        *backend.saved.lock().unwrap() = Some(Settings {
            work_minutes: i64::MAX,
            break_minutes: 7,
            ..Settings::default()
        });
        let store = SettingsStore::open(Box::new(backend));
        assert_eq!(store.get().work_minutes, DEFAULT_WORK_MINUTES);
        assert_eq!(store.get().break_minutes, 7);
    }

    #[test]
    fn test_ms_conversion_saturates() {
        let settings = Settings {
            work_minutes: i64::MAX,
            ..Settings::default()
        };
        assert_eq!(settings.work_ms(), i64::MAX);
    }

    #[test]
    fn test_failed_write_leaves_record_unchanged() {
        let backend = MemoryBackend::default();
        let mut store = SettingsStore::open(Box::new(backend.clone()));
        *backend.fail_writes.lock().unwrap() = true;

        let err = store
            .update(&SettingsPatch {
                work_minutes: Some(50),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert_eq!(store.get().work_minutes, 30);

        // The projection still moves; only the warning is surfaced.
        store.record_next_break(1_234);
        assert_eq!(store.get().next_break_timestamp, Some(1_234));
    }

    #[test]
    fn test_file_backend_round_trip_and_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::open(Box::new(JsonFileBackend::new(dir.path().to_path_buf())));
        store
            .update(&SettingsPatch {
                break_minutes: Some(10),
                ..Default::default()
            })
            .unwrap();
        store.record_next_break(1_700_000_000_000);

        let raw = fs::read_to_string(dir.path().join(SETTINGS_FILE_NAME)).unwrap();
        assert!(raw.contains("\"breakMinutes\": 10"));
        assert!(raw.contains("\"nextBreakTimestamp\": 1700000000000"));

        let reopened = SettingsStore::open(Box::new(JsonFileBackend::new(dir.path().to_path_buf())));
        assert_eq!(reopened.get().break_minutes, 10);
        assert_eq!(reopened.get().next_break_timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE_NAME), "{ not json").unwrap();
        let store = SettingsStore::open(Box::new(JsonFileBackend::new(dir.path().to_path_buf())));
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            r#"{"workMinutes": 20, "breakMinutes": 0}"#,
        )
        .unwrap();
        let store = SettingsStore::open(Box::new(JsonFileBackend::new(dir.path().to_path_buf())));
        let settings = store.get();
        assert_eq!(settings.work_minutes, 20);
        assert_eq!(settings.break_minutes, DEFAULT_BREAK_MINUTES);
        assert!(settings.auto_launch_enabled);
    }
}

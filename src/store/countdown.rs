//! Countdown settings store.
//!
//! Holds the display text plus either a plain remaining-seconds duration or
//! an absolute target time. With a target set, the duration is a read-time
//! projection; without one, the stored duration is authoritative. Settings
//! are persisted to a flat JSON file so they survive restarts.

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{ApiError, PersistError};
use crate::logger;

fn default_text() -> String {
    "Round 1 finishes in".to_string()
}

const fn default_duration() -> i64 {
    5 * 60
}

/// Persisted countdown settings.
///
/// `target_time` is a naive local timestamp; the admin panel only ever deals
/// in wall-clock times on the machine running the display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownSettings {
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_duration")]
    pub duration: i64,
    #[serde(default)]
    pub target_time: Option<NaiveDateTime>,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            text: default_text(),
            duration: default_duration(),
            target_time: None,
        }
    }
}

/// Partial update sent by the admin panel.
#[derive(Debug, Default, Deserialize)]
pub struct CountdownPatch {
    pub text: Option<String>,
    pub target_time: Option<String>,
    pub duration: Option<i64>,
}

/// Settings projected at a point in time, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountdownSnapshot {
    pub text: String,
    pub duration: i64,
    pub target_time: Option<String>,
}

/// Owner of the countdown state and its settings file.
pub struct CountdownStore {
    path: PathBuf,
    settings: Mutex<CountdownSettings>,
}

impl CountdownStore {
    /// Load settings from `path`, falling back to defaults on a missing or
    /// unreadable file. Never fails the process.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = load_settings(&path);
        Self {
            path,
            settings: Mutex::new(settings),
        }
    }

    /// Current state with the duration projected at the present moment.
    pub async fn current(&self) -> CountdownSnapshot {
        let settings = self.settings.lock().await;
        project(&settings, Local::now().naive_local())
    }

    /// Apply a patch, persist, and return the new effective state.
    ///
    /// The read-modify-persist sequence runs under the settings lock so
    /// concurrent updates cannot interleave. Persistence is best-effort: a
    /// write failure is logged and the in-memory state stays authoritative.
    pub async fn update(&self, patch: &CountdownPatch) -> Result<CountdownSnapshot, ApiError> {
        let mut settings = self.settings.lock().await;
        let now = Local::now().naive_local();
        apply_patch(&mut settings, patch, now)?;
        if let Err(e) = persist(&self.path, &settings) {
            logger::log_error(&format!("Countdown settings not persisted: {e}"));
        }
        Ok(project(&settings, now))
    }
}

/// Project the settings at `now`.
///
/// In target mode the remaining seconds floor at zero once the target has
/// elapsed; the target itself never rolls forward on read.
fn project(settings: &CountdownSettings, now: NaiveDateTime) -> CountdownSnapshot {
    let duration = match settings.target_time {
        Some(target) => (target - now).num_seconds().max(0),
        None => settings.duration,
    };
    CountdownSnapshot {
        text: settings.text.clone(),
        duration,
        target_time: settings
            .target_time
            .map(|t| t.format("%H:%M").to_string()),
    }
}

/// Apply a patch against `now`. On any validation error the settings are
/// left untouched.
fn apply_patch(
    settings: &mut CountdownSettings,
    patch: &CountdownPatch,
    now: NaiveDateTime,
) -> Result<(), ApiError> {
    if let Some(time_str) = patch.target_time.as_deref() {
        let (hour, minute) = parse_clock_time(time_str)?;
        let mut target = now.date().and_hms_opt(hour, minute, 0).ok_or_else(|| {
            ApiError::validation("Invalid time format. Use HH:MM format (e.g., '12:05')")
        })?;
        // "Today at HH:MM"; a moment not strictly in the future means
        // tomorrow.
        if target <= now {
            target += Duration::days(1);
        }
        settings.duration = (target - now).num_seconds();
        settings.target_time = Some(target);
    } else if let Some(duration) = patch.duration {
        if duration < 0 {
            return Err(ApiError::validation(
                "Invalid duration: must be a non-negative number of seconds",
            ));
        }
        settings.duration = duration;
        settings.target_time = None;
    }

    if let Some(text) = &patch.text {
        settings.text.clone_from(text);
    }

    Ok(())
}

/// Parse a 24-hour `H:MM`/`HH:MM` clock time.
fn parse_clock_time(input: &str) -> Result<(u32, u32), ApiError> {
    let pattern_error =
        || ApiError::validation("Invalid time format. Use HH:MM format (e.g., '12:05')");

    let (hours, minutes) = input.split_once(':').ok_or_else(pattern_error)?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if hours.len() > 2 || minutes.len() != 2 || !all_digits(hours) || !all_digits(minutes) {
        return Err(pattern_error());
    }

    let hour: u32 = hours.parse().map_err(|_| pattern_error())?;
    let minute: u32 = minutes.parse().map_err(|_| pattern_error())?;
    if hour > 23 || minute > 59 {
        return Err(ApiError::validation(
            "Invalid time format: hours must be 0-23, minutes 0-59",
        ));
    }

    Ok((hour, minute))
}

fn load_settings(path: &Path) -> CountdownSettings {
    if !path.exists() {
        return CountdownSettings::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(settings) => {
                logger::log_info(&format!(
                    "Loaded countdown settings from {}",
                    path.display()
                ));
                settings
            }
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to parse countdown settings {}: {e}, using defaults",
                    path.display()
                ));
                CountdownSettings::default()
            }
        },
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read countdown settings {}: {e}, using defaults",
                path.display()
            ));
            CountdownSettings::default()
        }
    }
}

fn persist(path: &Path, settings: &CountdownSettings) -> Result<(), PersistError> {
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(path, content).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_parse_clock_time_valid() {
        assert_eq!(parse_clock_time("0:00").unwrap(), (0, 0));
        assert_eq!(parse_clock_time("9:05").unwrap(), (9, 5));
        assert_eq!(parse_clock_time("12:05").unwrap(), (12, 5));
        assert_eq!(parse_clock_time("23:59").unwrap(), (23, 59));
    }

    #[test]
    fn test_parse_clock_time_invalid() {
        for input in [
            "", "12", "12:5", "12:345", "111:05", "24:00", "12:60", "ab:cd", "-1:05", "12:05:30",
        ] {
            assert!(
                matches!(parse_clock_time(input), Err(ApiError::Validation(_))),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_target_later_today() {
        let mut settings = CountdownSettings::default();
        let patch = CountdownPatch {
            target_time: Some("12:05".to_string()),
            ..CountdownPatch::default()
        };
        apply_patch(&mut settings, &patch, at(12, 0, 0)).unwrap();

        assert_eq!(settings.target_time, Some(at(12, 5, 0)));
        assert_eq!(settings.duration, 300);
    }

    #[test]
    fn test_elapsed_target_rolls_to_tomorrow() {
        let mut settings = CountdownSettings::default();
        let patch = CountdownPatch {
            target_time: Some("12:05".to_string()),
            ..CountdownPatch::default()
        };
        apply_patch(&mut settings, &patch, at(12, 10, 0)).unwrap();

        let target = settings.target_time.unwrap();
        assert_eq!(target, at(12, 5, 0) + Duration::days(1));
        assert_eq!(settings.duration, 24 * 3600 - 300);
    }

    #[test]
    fn test_target_equal_to_now_rolls_to_tomorrow() {
        let mut settings = CountdownSettings::default();
        let patch = CountdownPatch {
            target_time: Some("12:00".to_string()),
            ..CountdownPatch::default()
        };
        apply_patch(&mut settings, &patch, at(12, 0, 0)).unwrap();

        assert_eq!(settings.target_time, Some(at(12, 0, 0) + Duration::days(1)));
        assert_eq!(settings.duration, 24 * 3600);
    }

    #[test]
    fn test_duration_clears_target() {
        let mut settings = CountdownSettings::default();
        let target_patch = CountdownPatch {
            target_time: Some("18:30".to_string()),
            ..CountdownPatch::default()
        };
        apply_patch(&mut settings, &target_patch, at(9, 0, 0)).unwrap();
        assert!(settings.target_time.is_some());

        let duration_patch = CountdownPatch {
            duration: Some(120),
            ..CountdownPatch::default()
        };
        apply_patch(&mut settings, &duration_patch, at(9, 1, 0)).unwrap();

        assert_eq!(settings.target_time, None);
        assert_eq!(settings.duration, 120);
        assert_eq!(project(&settings, at(9, 1, 0)).target_time, None);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut settings = CountdownSettings::default();
        let patch = CountdownPatch {
            duration: Some(-5),
            ..CountdownPatch::default()
        };
        assert!(matches!(
            apply_patch(&mut settings, &patch, at(9, 0, 0)),
            Err(ApiError::Validation(_))
        ));
        assert_eq!(settings.duration, 300);
    }

    #[test]
    fn test_invalid_patch_leaves_state_unchanged() {
        let mut settings = CountdownSettings::default();
        let patch = CountdownPatch {
            text: Some("Changed".to_string()),
            target_time: Some("99:99".to_string()),
            duration: None,
        };
        assert!(apply_patch(&mut settings, &patch, at(9, 0, 0)).is_err());

        assert_eq!(settings.text, "Round 1 finishes in");
        assert_eq!(settings.duration, 300);
        assert_eq!(settings.target_time, None);
    }

    #[test]
    fn test_projection_clamps_elapsed_target_at_zero() {
        let settings = CountdownSettings {
            target_time: Some(at(12, 0, 0)),
            ..CountdownSettings::default()
        };

        let snapshot = project(&settings, at(12, 30, 0));
        assert_eq!(snapshot.duration, 0);
        assert_eq!(snapshot.target_time, Some("12:00".to_string()));
    }

    #[test]
    fn test_projection_formats_target_as_clock_time() {
        let settings = CountdownSettings {
            target_time: Some(at(8, 5, 0)),
            ..CountdownSettings::default()
        };

        let snapshot = project(&settings, at(8, 0, 0));
        assert_eq!(snapshot.duration, 300);
        assert_eq!(snapshot.target_time, Some("08:05".to_string()));
    }

    #[tokio::test]
    async fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CountdownStore::load(dir.path().join("times"));

        let snapshot = store.current().await;
        assert_eq!(snapshot.text, "Round 1 finishes in");
        assert_eq!(snapshot.duration, 300);
        assert_eq!(snapshot.target_time, None);
    }

    #[tokio::test]
    async fn test_defaults_when_file_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times");
        fs::write(&path, "not json").unwrap();

        let store = CountdownStore::load(&path);
        let snapshot = store.current().await;
        assert_eq!(snapshot.duration, 300);
    }

    #[tokio::test]
    async fn test_update_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times");

        let store = CountdownStore::load(&path);
        let patch = CountdownPatch {
            text: Some("Break ends in".to_string()),
            duration: Some(120),
            ..CountdownPatch::default()
        };
        store.update(&patch).await.unwrap();

        let reloaded = CountdownStore::load(&path);
        let snapshot = reloaded.current().await;
        assert_eq!(snapshot.text, "Break ends in");
        assert_eq!(snapshot.duration, 120);
        assert_eq!(snapshot.target_time, None);
    }

    #[test]
    fn test_persisted_target_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times");

        let settings = CountdownSettings {
            text: "Doors open in".to_string(),
            duration: 600,
            target_time: Some(at(18, 30, 0)),
        };
        persist(&path, &settings).unwrap();

        let loaded = load_settings(&path);
        assert_eq!(loaded.text, "Doors open in");
        assert_eq!(loaded.duration, 600);
        assert_eq!(loaded.target_time, Some(at(18, 30, 0)));
    }

    #[test]
    fn test_partial_settings_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times");
        fs::write(&path, r#"{"text": "Halftime"}"#).unwrap();

        let loaded = load_settings(&path);
        assert_eq!(loaded.text, "Halftime");
        assert_eq!(loaded.duration, 300);
        assert_eq!(loaded.target_time, None);
    }
}

//! Log repository contracts and JSON implementation.
//!
//! # Responsibility
//! - Serialize the full record list to one storage key and read it back.
//! - Reconstruct variant date fields based on each element's `calendarId`.
//!
//! # Invariants
//! - A missing or empty key loads as an empty list.
//! - Unreadable stored text is reported, never masked, at this layer.

use crate::model::calendar::CalendarKind;
use crate::model::log_record::LogRecord;
use crate::storage::{KeyValueStore, StorageError};
use log::{debug, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key holding the JSON array of all records.
pub const LOGS_STORAGE_KEY: &str = "dayfolio-logs";
/// Storage key receiving unreadable raw text before it gets overwritten.
pub const LOGS_BACKUP_KEY: &str = "dayfolio-logs.corrupt";

pub type RepoResult<T> = Result<T, RepoError>;

/// Stored text cannot be turned back into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedDataError {
    /// Text is not parseable JSON.
    InvalidJson(String),
    /// JSON root is not an array.
    NotAnArray,
    /// Element has a missing or unrecognized `calendarId`.
    UnknownCalendar {
        index: usize,
        calendar_id: Option<String>,
    },
    /// Element fields do not match its variant.
    InvalidElement { index: usize, message: String },
}

impl Display for MalformedDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "stored logs are not valid JSON: {message}"),
            Self::NotAnArray => write!(f, "stored logs are not a JSON array"),
            Self::UnknownCalendar {
                index,
                calendar_id: Some(calendar_id),
            } => write!(f, "log #{index} has unknown calendarId `{calendar_id}`"),
            Self::UnknownCalendar {
                index,
                calendar_id: None,
            } => write!(f, "log #{index} has no calendarId"),
            Self::InvalidElement { index, message } => write!(f, "log #{index} is invalid: {message}"),
        }
    }
}

impl Error for MalformedDataError {}

/// Persistence adapter error.
#[derive(Debug)]
pub enum RepoError {
    Malformed(MalformedDataError),
    Storage(StorageError),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "failed to access log storage: {err}"),
            Self::Encode(err) => write!(f, "failed to encode logs: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<MalformedDataError> for RepoError {
    fn from(value: MalformedDataError) -> Self {
        Self::Malformed(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Whole-list persistence contract.
pub trait LogRepository {
    /// Reads every stored record.
    fn load_logs(&self) -> RepoResult<Vec<LogRecord>>;
    /// Overwrites storage with exactly `logs`.
    fn save_logs(&mut self, logs: &[LogRecord]) -> RepoResult<()>;
    /// Copies the current raw stored text aside. Returns `false` when there
    /// was nothing to copy.
    fn quarantine_raw(&mut self) -> RepoResult<bool>;
}

/// JSON repository over any local-storage style backend.
pub struct JsonLogRepository<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> JsonLogRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Releases the backend, e.g. to reopen it as after a restart.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl<S: KeyValueStore> LogRepository for JsonLogRepository<S> {
    fn load_logs(&self) -> RepoResult<Vec<LogRecord>> {
        let Some(raw) = self.storage.get_item(LOGS_STORAGE_KEY)? else {
            debug!("event=logs_load module=repo status=ok source=empty count=0");
            return Ok(Vec::new());
        };

        let logs = decode_logs(&raw)?;
        debug!(
            "event=logs_load module=repo status=ok count={} bytes={}",
            logs.len(),
            raw.len()
        );
        Ok(logs)
    }

    fn save_logs(&mut self, logs: &[LogRecord]) -> RepoResult<()> {
        let encoded = encode_logs(logs)?;
        self.storage.set_item(LOGS_STORAGE_KEY, &encoded)?;
        debug!(
            "event=logs_save module=repo status=ok count={} bytes={}",
            logs.len(),
            encoded.len()
        );
        Ok(())
    }

    fn quarantine_raw(&mut self) -> RepoResult<bool> {
        let Some(raw) = self.storage.get_item(LOGS_STORAGE_KEY)? else {
            return Ok(false);
        };
        self.storage.set_item(LOGS_BACKUP_KEY, &raw)?;
        warn!(
            "event=logs_quarantine module=repo status=ok bytes={} backup_key={LOGS_BACKUP_KEY}",
            raw.len()
        );
        Ok(true)
    }
}

/// Serializes the full list as a JSON array.
pub fn encode_logs(logs: &[LogRecord]) -> RepoResult<String> {
    serde_json::to_string(logs).map_err(RepoError::Encode)
}

/// Parses stored text into records, dispatching on each element's
/// `calendarId`. Blank text decodes to an empty list.
pub fn decode_logs(raw: &str) -> Result<Vec<LogRecord>, MalformedDataError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let root: Value =
        serde_json::from_str(raw).map_err(|err| MalformedDataError::InvalidJson(err.to_string()))?;
    let Value::Array(elements) = root else {
        return Err(MalformedDataError::NotAnArray);
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| decode_element(index, element))
        .collect()
}

fn decode_element(index: usize, element: Value) -> Result<LogRecord, MalformedDataError> {
    let calendar_id = element.get("calendarId").and_then(Value::as_str);
    let known = calendar_id
        .is_some_and(|id| CalendarKind::ALL.iter().any(|kind| kind.as_str() == id));
    if !known {
        return Err(MalformedDataError::UnknownCalendar {
            index,
            calendar_id: calendar_id.map(str::to_string),
        });
    }

    serde_json::from_value(element).map_err(|err| MalformedDataError::InvalidElement {
        index,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_logs, encode_logs, MalformedDataError, RepoError};
    use crate::model::log_record::{LogBody, LogFields, LogRecord};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn decode_reconstructs_dates_per_variant() {
        let raw = json!([
            {
                "id": "a",
                "calendarId": "default",
                "title": "Trip",
                "memo": "",
                "start": "2024-02-01T00:00:00.000Z",
                "end": "2024-02-03T00:00:00.000Z",
                "isAllDay": true
            },
            {
                "id": "b",
                "calendarId": "study",
                "title": "Rust",
                "memo": "ch. 4",
                "date": "2024-02-02T09:30:00+09:00"
            }
        ])
        .to_string();

        let logs = decode_logs(&raw).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(
            logs[0].body,
            LogBody::Default {
                start: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap(),
                is_all_day: true,
            }
        );
        assert_eq!(
            logs[1].body,
            LogBody::Study {
                date: Utc.with_ymd_and_hms(2024, 2, 2, 0, 30, 0).unwrap(),
            }
        );
    }

    #[test]
    fn decode_tolerates_fields_missing_from_older_entries() {
        let raw = json!([
            {
                "id": "w",
                "calendarId": "workout",
                "title": "Squat",
                "date": "2024-01-10T00:00:00.000Z",
                "weight": null
            },
            {
                "id": "d",
                "calendarId": "default",
                "title": "Call",
                "start": "2024-01-11T10:00:00.000Z",
                "end": "2024-01-11T11:00:00.000Z"
            }
        ])
        .to_string();

        let logs = decode_logs(&raw).unwrap();
        assert_eq!(logs[0].memo, "");
        assert!(matches!(
            logs[0].body,
            LogBody::Workout {
                weight: None,
                reps: None,
                sets: None,
                ..
            }
        ));
        assert!(matches!(
            logs[1].body,
            LogBody::Default {
                is_all_day: false,
                ..
            }
        ));
    }

    #[test]
    fn decode_rounds_fractional_workout_counts() {
        let raw = json!([
            {
                "id": "s",
                "calendarId": "study",
                "title": "Rust",
                "date": "2024-01-09T00:00:00.000Z"
            },
            {
                "id": "w",
                "calendarId": "workout",
                "title": "Squat",
                "date": "2024-01-10T00:00:00.000Z",
                "weight": 42.5,
                "reps": 5.5,
                "sets": 2.2
            }
        ])
        .to_string();

        let logs = decode_logs(&raw).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, "s");
        assert!(matches!(
            logs[1].body,
            LogBody::Workout {
                weight: Some(weight),
                reps: Some(6),
                sets: Some(2),
                ..
            } if weight == 42.5
        ));
    }

    #[test]
    fn encode_rejects_non_finite_weight() {
        let date = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let logs = [LogRecord::with_id(
            "w",
            LogFields::new(
                "Bench",
                "",
                LogBody::Workout {
                    date,
                    weight: Some(f64::INFINITY),
                    reps: Some(5),
                    sets: Some(3),
                },
            ),
        )];

        assert!(matches!(encode_logs(&logs), Err(RepoError::Encode(_))));
    }

    #[test]
    fn decode_blank_text_is_empty() {
        assert!(decode_logs("").unwrap().is_empty());
        assert!(decode_logs("  \n").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_invalid_json_and_non_arrays() {
        assert!(matches!(
            decode_logs("[{"),
            Err(MalformedDataError::InvalidJson(_))
        ));
        assert_eq!(decode_logs("{}"), Err(MalformedDataError::NotAnArray));
    }

    #[test]
    fn decode_rejects_unknown_or_missing_calendar_id() {
        let unknown = json!([{ "id": "x", "calendarId": "diet", "title": "t", "memo": "" }]);
        assert_eq!(
            decode_logs(&unknown.to_string()),
            Err(MalformedDataError::UnknownCalendar {
                index: 0,
                calendar_id: Some("diet".to_string()),
            })
        );

        let missing = json!([
            { "id": "s", "calendarId": "study", "title": "t", "memo": "", "date": "2024-01-01T00:00:00Z" },
            { "id": "x", "title": "t", "memo": "" }
        ]);
        assert_eq!(
            decode_logs(&missing.to_string()),
            Err(MalformedDataError::UnknownCalendar {
                index: 1,
                calendar_id: None,
            })
        );
    }

    #[test]
    fn decode_rejects_fields_of_wrong_variant() {
        let raw = json!([{
            "id": "x",
            "calendarId": "default",
            "title": "t",
            "memo": "",
            "date": "2024-01-01T00:00:00Z"
        }]);

        let err = decode_logs(&raw.to_string()).unwrap_err();
        assert!(
            matches!(err, MalformedDataError::InvalidElement { index: 0, .. }),
            "unexpected error: {err}"
        );
    }
}

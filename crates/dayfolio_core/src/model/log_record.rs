//! Log record model.
//!
//! # Responsibility
//! - Define the canonical record shared by the default/workout/study calendars.
//! - Own the persisted wire shape (`calendarId` tag, camelCase fields).
//!
//! # Invariants
//! - `id` is generated once and never reused for another record.
//! - Variant-specific fields live in `LogBody`, so a record can only carry the
//!   fields of its own calendar.
//! - `start <= end` is not enforced for default records.

use crate::model::calendar::CalendarKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque record identifier. Freshly created records use a UUID v4 string.
pub type LogId = String;

/// Variant payload of a log record, tagged by `calendarId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calendarId", rename_all = "lowercase")]
pub enum LogBody {
    /// Ranged event.
    Default {
        #[serde(with = "iso_millis")]
        start: DateTime<Utc>,
        #[serde(with = "iso_millis")]
        end: DateTime<Utc>,
        #[serde(rename = "isAllDay", default)]
        is_all_day: bool,
    },
    /// Workout set. Numeric fields are persisted as `null` when absent.
    ///
    /// `weight` must be finite to be written. Fractional `reps`/`sets` from
    /// older entries are rounded to the nearest whole count on read.
    Workout {
        #[serde(with = "iso_millis")]
        date: DateTime<Utc>,
        #[serde(default, serialize_with = "workout_numbers::finite_weight")]
        weight: Option<f64>,
        #[serde(default, deserialize_with = "workout_numbers::rounded_count")]
        reps: Option<i64>,
        #[serde(default, deserialize_with = "workout_numbers::rounded_count")]
        sets: Option<i64>,
    },
    /// Study session.
    Study {
        #[serde(with = "iso_millis")]
        date: DateTime<Utc>,
    },
}

impl LogBody {
    /// Returns the calendar this payload belongs to.
    pub fn calendar_kind(&self) -> CalendarKind {
        match self {
            Self::Default { .. } => CalendarKind::Default,
            Self::Workout { .. } => CalendarKind::Workout,
            Self::Study { .. } => CalendarKind::Study,
        }
    }

    /// Date used to place the record on a calendar.
    pub fn anchor_date(&self) -> DateTime<Utc> {
        match self {
            Self::Default { start, .. } => *start,
            Self::Workout { date, .. } | Self::Study { date } => *date,
        }
    }
}

/// Full field set supplied on create and on update.
///
/// Updates replace every field; there is no partial patch.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFields {
    pub title: String,
    pub memo: String,
    pub body: LogBody,
}

impl LogFields {
    pub fn new(title: impl Into<String>, memo: impl Into<String>, body: LogBody) -> Self {
        Self {
            title: title.into(),
            memo: memo.into(),
            body,
        }
    }
}

/// Persisted log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: LogId,
    pub title: String,
    /// Older stored entries may omit the memo entirely.
    #[serde(default)]
    pub memo: String,
    #[serde(flatten)]
    pub body: LogBody,
}

impl LogRecord {
    /// Creates a record with a freshly generated id.
    pub fn new(fields: LogFields) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), fields)
    }

    /// Creates a record with a caller-provided id.
    ///
    /// Used by import paths and fixtures where identity already exists.
    pub fn with_id(id: impl Into<LogId>, fields: LogFields) -> Self {
        Self {
            id: id.into(),
            title: fields.title,
            memo: fields.memo,
            body: fields.body,
        }
    }

    pub fn calendar_kind(&self) -> CalendarKind {
        self.body.calendar_kind()
    }

    /// See [`LogBody::anchor_date`].
    pub fn anchor_date(&self) -> DateTime<Utc> {
        self.body.anchor_date()
    }

    /// Replaces every mutable field while keeping the id.
    pub(crate) fn replace_fields(&mut self, fields: LogFields) {
        self.title = fields.title;
        self.memo = fields.memo;
        self.body = fields.body;
    }
}

/// ISO-8601 with millisecond precision and `Z` suffix, the shape browsers
/// emit for `Date` values. Any RFC 3339 offset is accepted on read.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|value| value.with_timezone(&Utc))
            .map_err(|err| serde::de::Error::custom(format!("invalid timestamp `{raw}`: {err}")))
    }
}

mod workout_numbers {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// JSON has no spelling for NaN or infinity; refuse instead of writing `null`.
    pub fn finite_weight<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(weight) if !weight.is_finite() => Err(serde::ser::Error::custom(format!(
                "workout weight must be finite, got {weight}"
            ))),
            _ => value.serialize(serializer),
        }
    }

    pub fn rounded_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<f64>::deserialize(deserializer)?;
        Ok(raw.map(|count| count.round() as i64))
    }
}

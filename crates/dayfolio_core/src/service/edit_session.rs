//! Create/edit dialog state machine.
//!
//! # Responsibility
//! - Track which record is being created or edited and its draft fields.
//! - Validate the draft and commit it into the record store.
//!
//! # Invariants
//! - At most one session is active; starting a new one discards the draft.
//! - A failed commit leaves the session open with its draft intact.
//! - The draft is never persisted.

use crate::model::calendar::CalendarKind;
use crate::model::log_record::{LogBody, LogFields, LogRecord};
use crate::repo::log_repo::LogRepository;
use crate::service::log_store::{LogStore, StoreError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FORM_DATE_FORMAT: &str = "%Y-%m-%d";
const FORM_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const MISSING_RANGE_MESSAGE: &str = "Enter both a start and an end date.";
const MISSING_DATE_MESSAGE: &str = "Pick a date for this entry.";
const INVALID_WEIGHT_MESSAGE: &str = "Weight must be a finite number.";

/// User-facing reason a commit was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: String,
}

impl ValidationFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ValidationFailure {}

#[derive(Debug)]
pub enum SessionError {
    Validation(ValidationFailure),
    /// Commit or delete without an open session.
    NotOpen,
    /// Delete while creating.
    NotEditing,
    /// Form text could not be read as a date.
    InvalidInput(String),
    Store(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotOpen => write!(f, "no log is being created or edited"),
            Self::NotEditing => write!(f, "only an existing log can be deleted"),
            Self::InvalidInput(value) => write!(f, "invalid date input: `{value}`"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Current dialog mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionMode {
    #[default]
    Closed,
    /// New record for the slot at `date`.
    Creating { date: DateTime<Utc> },
    /// Existing record, as it was when editing started.
    Editing { log: LogRecord },
}

/// Form fields for every calendar at once.
///
/// Only the slots of the target calendar are read on commit.
#[derive(Debug, Clone, PartialEq)]
pub struct LogDraft {
    pub title: String,
    pub memo: String,
    pub is_all_day: bool,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub date: Option<DateTime<Utc>>,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: Option<i64>,
}

impl Default for LogDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            memo: String::new(),
            // The form opens with the all-day box ticked.
            is_all_day: true,
            start: None,
            end: None,
            date: None,
            weight: None,
            reps: None,
            sets: None,
        }
    }
}

impl LogDraft {
    fn from_log(log: &LogRecord) -> Self {
        let mut draft = Self {
            title: log.title.clone(),
            memo: log.memo.clone(),
            ..Self::default()
        };
        match log.body {
            LogBody::Default {
                start,
                end,
                is_all_day,
            } => {
                draft.start = Some(start);
                draft.end = Some(end);
                draft.is_all_day = is_all_day;
            }
            LogBody::Workout {
                date,
                weight,
                reps,
                sets,
            } => {
                draft.date = Some(date);
                draft.weight = weight;
                draft.reps = reps;
                draft.sets = sets;
            }
            LogBody::Study { date } => draft.date = Some(date),
        }
        draft
    }

    fn to_fields(&self, kind: CalendarKind) -> Result<LogFields, ValidationFailure> {
        let body = match kind {
            CalendarKind::Default => {
                let (Some(start), Some(end)) = (self.start, self.end) else {
                    return Err(ValidationFailure::new(MISSING_RANGE_MESSAGE));
                };
                LogBody::Default {
                    start,
                    end,
                    is_all_day: self.is_all_day,
                }
            }
            CalendarKind::Workout => {
                if self.weight.is_some_and(|weight| !weight.is_finite()) {
                    return Err(ValidationFailure::new(INVALID_WEIGHT_MESSAGE));
                }
                LogBody::Workout {
                    date: self.required_date()?,
                    weight: self.weight,
                    reps: self.reps,
                    sets: self.sets,
                }
            }
            CalendarKind::Study => LogBody::Study {
                date: self.required_date()?,
            },
        };
        Ok(LogFields::new(self.title.clone(), self.memo.clone(), body))
    }

    fn required_date(&self) -> Result<DateTime<Utc>, ValidationFailure> {
        self.date
            .ok_or_else(|| ValidationFailure::new(MISSING_DATE_MESSAGE))
    }
}

/// Single create/edit session feeding a [`LogStore`].
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    mode: SessionMode,
    draft: LogDraft,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.mode, SessionMode::Closed)
    }

    pub fn draft(&self) -> &LogDraft {
        &self.draft
    }

    /// Form view writes go here.
    pub fn draft_mut(&mut self) -> &mut LogDraft {
        &mut self.draft
    }

    /// Opens an empty draft for the slot at `date`.
    pub fn begin_create(&mut self, date: DateTime<Utc>) {
        self.draft = LogDraft {
            date: Some(date),
            ..LogDraft::default()
        };
        self.mode = SessionMode::Creating { date };
        debug!("event=session_open module=session status=ok mode=creating");
    }

    /// Opens a draft populated from `log`.
    pub fn begin_edit(&mut self, log: &LogRecord) {
        self.draft = LogDraft::from_log(log);
        self.mode = SessionMode::Editing { log: log.clone() };
        debug!(
            "event=session_open module=session status=ok mode=editing id={}",
            log.id
        );
    }

    /// Validates the draft and creates or updates the record.
    ///
    /// New records take the store's active calendar; edited records keep
    /// their own. On error the session stays open.
    pub fn commit<R: LogRepository>(
        &mut self,
        store: &mut LogStore<R>,
    ) -> Result<LogRecord, SessionError> {
        let saved = match &self.mode {
            SessionMode::Closed => return Err(SessionError::NotOpen),
            SessionMode::Creating { .. } => {
                let fields = self
                    .draft
                    .to_fields(store.active_calendar())
                    .map_err(SessionError::Validation)?;
                store.create(fields)?
            }
            SessionMode::Editing { log } => {
                let fields = self
                    .draft
                    .to_fields(log.calendar_kind())
                    .map_err(SessionError::Validation)?;
                store.update(&log.id, fields)?
            }
        };

        self.close();
        info!(
            "event=session_commit module=session status=ok calendar={} id={}",
            saved.calendar_kind(),
            saved.id
        );
        Ok(saved)
    }

    /// Discards the draft without touching the store.
    pub fn cancel(&mut self) {
        self.close();
    }

    /// Deletes the record being edited.
    pub fn delete<R: LogRepository>(
        &mut self,
        store: &mut LogStore<R>,
    ) -> Result<LogRecord, SessionError> {
        let id = match &self.mode {
            SessionMode::Editing { log } => log.id.clone(),
            SessionMode::Creating { .. } => return Err(SessionError::NotEditing),
            SessionMode::Closed => return Err(SessionError::NotOpen),
        };

        let removed = store.delete(&id)?;
        self.close();
        Ok(removed)
    }

    fn close(&mut self) {
        self.mode = SessionMode::Closed;
        self.draft = LogDraft::default();
    }
}

/// Reads date text from the form.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or RFC 3339. Naive values are
/// taken as UTC. All-day values are truncated to midnight.
pub fn parse_form_datetime(input: &str, all_day: bool) -> Result<DateTime<Utc>, SessionError> {
    let trimmed = input.trim();
    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .map(|value| value.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, FORM_DATETIME_FORMAT).map(|value| value.and_utc())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, FORM_DATE_FORMAT)
                .map(|value| value.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|_| SessionError::InvalidInput(trimmed.to_string()))?;

    if all_day {
        Ok(parsed.date_naive().and_time(NaiveTime::MIN).and_utc())
    } else {
        Ok(parsed)
    }
}

/// Formats a timestamp for the form's date or datetime input.
pub fn format_form_datetime(value: DateTime<Utc>, all_day: bool) -> String {
    let format = if all_day {
        FORM_DATE_FORMAT
    } else {
        FORM_DATETIME_FORMAT
    };
    value.format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_form_datetime, parse_form_datetime, LogDraft, SessionError};
    use crate::model::calendar::CalendarKind;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parse_form_datetime_accepts_form_shapes() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap();

        assert_eq!(parse_form_datetime("2024-03-01", true).unwrap(), midnight);
        assert_eq!(parse_form_datetime("2024-03-01", false).unwrap(), midnight);
        assert_eq!(parse_form_datetime("2024-03-01T09:15", false).unwrap(), morning);
        assert_eq!(parse_form_datetime("2024-03-01T09:15", true).unwrap(), midnight);
        assert_eq!(
            parse_form_datetime("2024-03-01T09:15:00.000Z", false).unwrap(),
            morning
        );
    }

    #[test]
    fn parse_form_datetime_rejects_garbage() {
        let err = parse_form_datetime("next tuesday", false).unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(value) if value == "next tuesday"));
    }

    #[test]
    fn format_form_datetime_matches_input_widgets() {
        let value = Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 42).unwrap();
        assert_eq!(format_form_datetime(value, true), "2024-03-01");
        assert_eq!(format_form_datetime(value, false), "2024-03-01T09:15");
    }

    #[test]
    fn empty_draft_defaults_to_all_day() {
        let draft = LogDraft::default();
        assert!(draft.is_all_day);
        assert!(draft.title.is_empty());
        assert!(draft.to_fields(CalendarKind::Default).is_err());
        assert!(draft.to_fields(CalendarKind::Study).is_err());
    }
}

//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the calendar view and log dialog operations to Dart via FRB.
//! - Hold the single process-wide store and edit session.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All calls are serialized through one mutex; no two mutations interleave.
//! - Dates cross the boundary as strings: ISO-8601 for events, form input
//!   shapes (`YYYY-MM-DD` / `YYYY-MM-DDTHH:MM`) for the draft.

use chrono::{DateTime, SecondsFormat, Utc};
use dayfolio_core::{
    core_version as core_version_inner, format_form_datetime,
    init_logging as init_logging_inner, parse_form_datetime, ping as ping_inner, CalendarEvent,
    CalendarKind, EditSession, JsonLogRepository, LoadOutcome, LogStore, SessionError,
    SessionMode, SqliteKeyValueStore,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const DB_FILE_NAME: &str = "dayfolio.sqlite3";
const DB_PATH_ENV: &str = "DAYFOLIO_DB_PATH";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static APP: Mutex<Option<CalendarApp>> = Mutex::new(None);

type AppStore = LogStore<JsonLogRepository<SqliteKeyValueStore>>;

struct CalendarApp {
    store: AppStore,
    session: EditSession,
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected log ID, when there is one.
    pub log_id: Option<String>,
    /// Human-readable message; validation text is meant for display as-is.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, log_id: Option<String>) -> Self {
        Self {
            ok: true,
            log_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            log_id: None,
            message: message.into(),
        }
    }

    fn from_result(result: Result<(String, Option<String>), String>) -> Self {
        match result {
            Ok((message, log_id)) => Self::success(message, log_id),
            Err(message) => Self::failure(message),
        }
    }
}

/// One calendar entry for the month view.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEventItem {
    pub log_id: String,
    pub calendar: String,
    pub title: String,
    /// ISO-8601 UTC.
    pub start: String,
    /// ISO-8601 UTC.
    pub end: String,
    pub all_day: bool,
}

/// Dialog state read by the form view.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// `closed|creating|editing`.
    pub mode: String,
    /// Edited log ID; `None` unless editing.
    pub log_id: Option<String>,
    /// Calendar whose fields the form should show.
    pub calendar: String,
    pub title: String,
    pub memo: String,
    pub is_all_day: bool,
    /// Form input text; empty when unset.
    pub start: String,
    pub end: String,
    pub date: String,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: Option<i64>,
}

/// Form field values written back by the dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftInput {
    pub title: String,
    pub memo: String,
    pub is_all_day: bool,
    /// Empty text clears the slot.
    pub start: String,
    pub end: String,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: Option<i64>,
}

/// Opens storage and loads persisted logs. Safe to call again once open.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_open() -> ActionResponse {
    let mut guard = match APP.lock() {
        Ok(guard) => guard,
        Err(_) => return ActionResponse::failure("calendar_open failed: state lock poisoned"),
    };
    if let Some(app) = guard.as_ref() {
        let count = app.store.logs().len();
        return ActionResponse::success(format!("Already open with {count} log(s)."), None);
    }

    let db_path = resolve_db_path();
    let storage = match SqliteKeyValueStore::open(&db_path) {
        Ok(storage) => storage,
        Err(err) => return ActionResponse::failure(format!("calendar_open failed: {err}")),
    };
    let mut store = LogStore::new(JsonLogRepository::new(storage));
    let message = match store.initialize() {
        Ok(LoadOutcome::Loaded(count)) => format!("Loaded {count} log(s)."),
        Ok(LoadOutcome::Recovered(err)) => {
            warn!("event=calendar_open module=ffi status=recovered error={err}");
            "Stored logs could not be read and were set aside; starting empty.".to_string()
        }
        Err(err) => return ActionResponse::failure(format!("calendar_open failed: {err}")),
    };

    *guard = Some(CalendarApp {
        store,
        session: EditSession::new(),
    });
    ActionResponse::success(message, None)
}

/// Switches the visible calendar (`default|workout|study`).
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_set_active(calendar: String) -> ActionResponse {
    ActionResponse::from_result(with_app(|app| {
        let kind = parse_calendar(&calendar)?;
        app.store.set_active_calendar(kind);
        Ok((format!("Showing {kind} calendar."), None))
    }))
}

/// Returns the active calendar label, or an empty string before open.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_active() -> String {
    with_app(|app| Ok(app.store.active_calendar().as_str().to_string())).unwrap_or_default()
}

/// Events of the active calendar. Empty before open.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_events() -> Vec<CalendarEventItem> {
    with_app(|app| Ok(app.store.events().map(to_event_item).collect())).unwrap_or_default()
}

/// Calendar callback: an empty slot was selected.
#[flutter_rust_bridge::frb(sync)]
pub fn session_select_slot(date: String) -> ActionResponse {
    ActionResponse::from_result(with_app(|app| {
        let date = parse_form_datetime(&date, false).map_err(|err| err.to_string())?;
        app.session.begin_create(date);
        Ok(("Creating log.".to_string(), None))
    }))
}

/// Calendar callback: an existing entry was selected.
#[flutter_rust_bridge::frb(sync)]
pub fn session_select_event(log_id: String) -> ActionResponse {
    ActionResponse::from_result(with_app(|app| {
        let log = app
            .store
            .get(&log_id)
            .ok_or_else(|| format!("log not found: {log_id}"))?;
        app.session.begin_edit(log);
        Ok(("Editing log.".to_string(), Some(log_id.clone())))
    }))
}

/// Current dialog mode and draft values.
#[flutter_rust_bridge::frb(sync)]
pub fn session_state() -> SessionState {
    with_app(|app| Ok(to_session_state(app))).unwrap_or_else(|_| closed_state())
}

/// Writes form values into the draft. Date text is parsed here so the
/// dialog can show input errors before commit.
#[flutter_rust_bridge::frb(sync)]
pub fn session_update_draft(input: DraftInput) -> ActionResponse {
    ActionResponse::from_result(with_app(|app| {
        if !app.session.is_open() {
            return Err(SessionError::NotOpen.to_string());
        }
        let start = parse_optional_input(&input.start, input.is_all_day)?;
        let end = parse_optional_input(&input.end, input.is_all_day)?;

        let draft = app.session.draft_mut();
        draft.title = input.title.trim().to_string();
        draft.memo = input.memo;
        draft.is_all_day = input.is_all_day;
        draft.start = start;
        draft.end = end;
        draft.weight = input.weight;
        draft.reps = input.reps;
        draft.sets = input.sets;
        Ok(("Draft updated.".to_string(), None))
    }))
}

/// Saves the draft as a new or updated log.
#[flutter_rust_bridge::frb(sync)]
pub fn session_commit() -> ActionResponse {
    ActionResponse::from_result(with_app(|app| {
        let CalendarApp { store, session } = app;
        let saved = session.commit(store).map_err(|err| err.to_string())?;
        Ok(("Log saved.".to_string(), Some(saved.id)))
    }))
}

/// Closes the dialog without saving.
#[flutter_rust_bridge::frb(sync)]
pub fn session_cancel() -> ActionResponse {
    ActionResponse::from_result(with_app(|app| {
        app.session.cancel();
        Ok(("Closed.".to_string(), None))
    }))
}

/// Deletes the log being edited.
#[flutter_rust_bridge::frb(sync)]
pub fn session_delete() -> ActionResponse {
    ActionResponse::from_result(with_app(|app| {
        let CalendarApp { store, session } = app;
        let removed = session.delete(store).map_err(|err| err.to_string())?;
        Ok(("Log deleted.".to_string(), Some(removed.id)))
    }))
}

fn with_app<T>(f: impl FnOnce(&mut CalendarApp) -> Result<T, String>) -> Result<T, String> {
    let mut guard = APP
        .lock()
        .map_err(|_| "calendar state lock poisoned".to_string())?;
    let app = guard
        .as_mut()
        .ok_or_else(|| "calendar is not open; call calendar_open first".to_string())?;
    f(app)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn parse_calendar(value: &str) -> Result<CalendarKind, String> {
    CalendarKind::parse(value).ok_or_else(|| {
        format!("unknown calendar `{value}`; expected default|workout|study")
    })
}

fn parse_optional_input(value: &str, all_day: bool) -> Result<Option<DateTime<Utc>>, String> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_form_datetime(value, all_day)
        .map(Some)
        .map_err(|err| err.to_string())
}

fn to_event_item(event: CalendarEvent<'_>) -> CalendarEventItem {
    CalendarEventItem {
        log_id: event.log.id.clone(),
        calendar: event.log.calendar_kind().as_str().to_string(),
        title: event.title.to_string(),
        start: to_iso(event.start),
        end: to_iso(event.end),
        all_day: event.all_day(),
    }
}

fn to_session_state(app: &CalendarApp) -> SessionState {
    let (mode, log_id, calendar) = match app.session.mode() {
        SessionMode::Closed => return closed_state(),
        SessionMode::Creating { .. } => ("creating", None, app.store.active_calendar()),
        SessionMode::Editing { log } => ("editing", Some(log.id.clone()), log.calendar_kind()),
    };
    let draft = app.session.draft();
    let form = |value: Option<DateTime<Utc>>| {
        value
            .map(|value| format_form_datetime(value, draft.is_all_day))
            .unwrap_or_default()
    };

    SessionState {
        mode: mode.to_string(),
        log_id,
        calendar: calendar.as_str().to_string(),
        title: draft.title.clone(),
        memo: draft.memo.clone(),
        is_all_day: draft.is_all_day,
        start: form(draft.start),
        end: form(draft.end),
        date: draft
            .date
            .map(|value| format_form_datetime(value, true))
            .unwrap_or_default(),
        weight: draft.weight,
        reps: draft.reps,
        sets: draft.sets,
    }
}

fn closed_state() -> SessionState {
    SessionState {
        mode: "closed".to_string(),
        log_id: None,
        calendar: String::new(),
        title: String::new(),
        memo: String::new(),
        is_all_day: true,
        start: String::new(),
        end: String::new(),
        date: String::new(),
        weight: None,
        reps: None,
        sets: None,
    }
}

fn to_iso(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

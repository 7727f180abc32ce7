//! Core domain logic for Dayfolio.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::calendar::CalendarKind;
pub use model::log_record::{LogBody, LogFields, LogId, LogRecord};
pub use repo::log_repo::{
    JsonLogRepository, LogRepository, MalformedDataError, RepoError, RepoResult,
    LOGS_BACKUP_KEY, LOGS_STORAGE_KEY,
};
pub use service::edit_session::{
    format_form_datetime, parse_form_datetime, EditSession, LogDraft, SessionError, SessionMode,
    ValidationFailure,
};
pub use service::log_store::{LoadOutcome, LogStore, StoreError, StoreResult};
pub use service::projection::{project_events, CalendarEvent};
pub use storage::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! In-memory record store.
//!
//! # Responsibility
//! - Own the record list and the active calendar filter.
//! - Persist the whole list after every create/update/delete.
//!
//! # Invariants
//! - Nothing is saved before `initialize` has applied the stored list.
//! - Record ids are unique and a record never changes calendar.
//! - A failed save rolls the in-memory change back, so memory always equals
//!   the last persisted list.

use crate::model::calendar::CalendarKind;
use crate::model::log_record::{LogFields, LogRecord};
use crate::repo::log_repo::{LogRepository, MalformedDataError, RepoError};
use crate::service::projection::{project_events, CalendarEvent};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store failure.
#[derive(Debug)]
pub enum StoreError {
    /// A mutation ran before `initialize`.
    NotInitialized,
    /// `initialize` ran twice.
    AlreadyInitialized,
    /// No record has this id.
    NotFound(String),
    /// Update payload belongs to a different calendar than the record.
    VariantMismatch {
        id: String,
        expected: CalendarKind,
        found: CalendarKind,
    },
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "log store is not initialized"),
            Self::AlreadyInitialized => write!(f, "log store is already initialized"),
            Self::NotFound(id) => write!(f, "log not found: {id}"),
            Self::VariantMismatch {
                id,
                expected,
                found,
            } => write!(
                f,
                "log {id} belongs to calendar `{expected}`, cannot store `{found}` fields"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of startup loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored list applied with this many records.
    Loaded(usize),
    /// Stored text was unreadable; the store started empty.
    Recovered(MalformedDataError),
}

/// Record list plus active calendar, backed by a repository.
pub struct LogStore<R: LogRepository> {
    repo: R,
    logs: Vec<LogRecord>,
    active_calendar: CalendarKind,
    initialized: bool,
}

impl<R: LogRepository> LogStore<R> {
    /// Creates an empty, uninitialized store.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            logs: Vec::new(),
            active_calendar: CalendarKind::default(),
            initialized: false,
        }
    }

    /// Loads the persisted list. Must run once before any mutation.
    ///
    /// Unreadable stored data is copied to the backup key when possible and
    /// the store starts empty; a failed backup copy is only logged. Storage
    /// read failures are returned.
    pub fn initialize(&mut self) -> StoreResult<LoadOutcome> {
        if self.initialized {
            return Err(StoreError::AlreadyInitialized);
        }

        let outcome = match self.repo.load_logs() {
            Ok(logs) => {
                self.logs = logs;
                LoadOutcome::Loaded(self.logs.len())
            }
            Err(RepoError::Malformed(err)) => {
                error!(
                    "event=store_init module=store status=recovered error_code=malformed_data error={err}"
                );
                // Backup is best-effort; the store still starts empty.
                if let Err(backup_err) = self.repo.quarantine_raw() {
                    warn!(
                        "event=logs_quarantine module=store status=error error={backup_err}"
                    );
                }
                self.logs.clear();
                LoadOutcome::Recovered(err)
            }
            Err(err) => {
                error!("event=store_init module=store status=error error={err}");
                return Err(err.into());
            }
        };

        self.initialized = true;
        info!(
            "event=store_init module=store status=ok count={}",
            self.logs.len()
        );
        Ok(outcome)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Creates a record with a fresh id and persists the list.
    pub fn create(&mut self, fields: LogFields) -> StoreResult<LogRecord> {
        self.ensure_initialized()?;

        let record = LogRecord::new(fields);
        self.logs.push(record.clone());
        if let Err(err) = self.persist("create") {
            self.logs.pop();
            return Err(err);
        }

        info!(
            "event=log_create module=store status=ok calendar={} id={}",
            record.calendar_kind(),
            record.id
        );
        Ok(record)
    }

    /// Replaces every field of the record with `id`.
    ///
    /// The new body must belong to the record's existing calendar.
    pub fn update(&mut self, id: &str, fields: LogFields) -> StoreResult<LogRecord> {
        self.ensure_initialized()?;

        let index = self.position(id)?;
        let expected = self.logs[index].calendar_kind();
        let found = fields.body.calendar_kind();
        if expected != found {
            warn!(
                "event=log_update module=store status=rejected error_code=variant_mismatch id={id} expected={expected} found={found}"
            );
            return Err(StoreError::VariantMismatch {
                id: id.to_string(),
                expected,
                found,
            });
        }

        let previous = self.logs[index].clone();
        self.logs[index].replace_fields(fields);
        if let Err(err) = self.persist("update") {
            self.logs[index] = previous;
            return Err(err);
        }

        info!("event=log_update module=store status=ok calendar={expected} id={id}");
        Ok(self.logs[index].clone())
    }

    /// Removes the record with `id` and returns it.
    pub fn delete(&mut self, id: &str) -> StoreResult<LogRecord> {
        self.ensure_initialized()?;

        let index = self.position(id)?;
        let removed = self.logs.remove(index);
        if let Err(err) = self.persist("delete") {
            self.logs.insert(index, removed);
            return Err(err);
        }

        info!(
            "event=log_delete module=store status=ok calendar={} id={id}",
            removed.calendar_kind()
        );
        Ok(removed)
    }

    /// Switches the visible/creatable calendar. Not persisted.
    pub fn set_active_calendar(&mut self, kind: CalendarKind) {
        self.active_calendar = kind;
    }

    pub fn active_calendar(&self) -> CalendarKind {
        self.active_calendar
    }

    /// All records in insertion order.
    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    pub fn get(&self, id: &str) -> Option<&LogRecord> {
        self.logs.iter().find(|log| log.id == id)
    }

    /// Calendar events for the active calendar, recomputed on each call.
    pub fn events(&self) -> impl Iterator<Item = CalendarEvent<'_>> + Clone + '_ {
        project_events(&self.logs, self.active_calendar)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Releases the repository, e.g. to simulate a restart in tests.
    pub fn into_repository(self) -> R {
        self.repo
    }

    fn ensure_initialized(&self) -> StoreResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    fn position(&self, id: &str) -> StoreResult<usize> {
        self.logs
            .iter()
            .position(|log| log.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn persist(&mut self, operation: &'static str) -> StoreResult<()> {
        self.repo.save_logs(&self.logs).map_err(|err| {
            error!(
                "event=log_{operation} module=store status=error error_code=save_failed error={err}"
            );
            StoreError::from(err)
        })
    }
}

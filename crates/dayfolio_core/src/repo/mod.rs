//! Persistence adapter for the log record list.
//!
//! # Responsibility
//! - Define the whole-list load/save contract used by the record store.
//! - Isolate the JSON wire format from storage backends.
//!
//! # Invariants
//! - Saves always overwrite the full list; there is no incremental write.
//! - Load returns semantic errors (`Malformed`) separately from storage
//!   transport errors.

pub mod log_repo;

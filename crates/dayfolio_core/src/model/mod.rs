//! Log record domain model.
//!
//! # Responsibility
//! - Define the three log record variants and their shared identity fields.
//! - Define the calendar selector used to filter and create records.
//!
//! # Invariants
//! - Every record is identified by a stable `LogId`.
//! - The variant of a record is fixed at creation.

pub mod calendar;
pub mod log_record;

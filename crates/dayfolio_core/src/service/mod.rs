//! Core use-case services.
//!
//! # Responsibility
//! - Own the record list and apply create/update/delete with persistence.
//! - Derive calendar events and drive the create/edit dialog.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod edit_session;
pub mod log_store;
pub mod projection;

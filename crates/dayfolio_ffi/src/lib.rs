//! Flutter bridge for the Dayfolio core.

pub mod api;

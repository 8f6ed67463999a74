//! Payroll engine library crate.
//!
//! This crate exposes the payroll reconciliation engine as reusable
//! modules: numeric formatting and parsing, the editable worksheet,
//! the totals aggregator, the record load/save boundary, and the edit
//! session tying them together.  External applications may depend on
//! the `payroll_engine` crate and drive `session::EditSession`
//! directly or embed the HTTP API via `api::build_router`.

pub mod api;
pub mod engine;
pub mod error;
pub mod fields;
pub mod models;
pub mod numeric;
pub mod record;
pub mod session;

//! Startup reconciliation
//!
//! Wake requests do not survive a restart of the host. On every start the
//! runner re-derives them from durable state.

pub mod runner;

pub use runner::{remaining_snooze_minutes, ReconciliationReport, ReconciliationRunner};

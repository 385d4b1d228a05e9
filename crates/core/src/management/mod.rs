//! Medication and alarm management
//!
//! Every change to an alarm row is followed by the matching scheduler call so
//! the wake requests always mirror the stored definitions.

pub mod service;

pub use service::AlarmService;

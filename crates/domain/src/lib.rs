//! # MedAlarm Domain
//!
//! Business domain types and models for the medication alarm engine.
//!
//! This crate contains:
//! - Domain data types (Medication, AlarmSchedule, DoseHistory, FirePayload)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Reminder policy constants
//!
//! ## Architecture
//! - No dependencies on other MedAlarm crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

//! # MedAlarm Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite/SQLCipher stores behind an r2d2 pool
//! - The tokio-backed wake timer and the fire dispatcher
//! - The logging presenter adapter
//! - Configuration loading and logging initialisation
//!
//! ## Architecture
//! - Implements traits defined in `medalarm-core`
//! - Contains all "impure" code (I/O, timers, process environment)

pub mod config;
pub mod database;
pub mod errors;
pub mod observability;
pub mod presentation;
pub mod scheduling;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use presentation::TracingPresenter;
pub use scheduling::{DispatcherError, FireDispatcher, FireDispatcherConfig, TokioWakeTimer};

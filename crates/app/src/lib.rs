//! # MedAlarm application
//!
//! Wires the infrastructure adapters into the core services and owns their
//! lifecycle.

pub mod context;

pub use context::AppContext;

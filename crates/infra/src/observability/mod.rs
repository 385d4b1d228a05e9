//! Observability infrastructure
//!
//! Structured logging through `tracing`. Every crate emits spans and events;
//! the binary installs the subscriber once at startup.

pub mod logging;

pub use logging::init_logging;

//! Wake timer and fire dispatch
//!
//! [`TokioWakeTimer`] arms one tokio task per outstanding wake key and sends
//! the payload down a channel when it fires. [`FireDispatcher`] owns the
//! receiving end and hands every payload to the dose resolver.
//!
//! Lifecycle rules:
//! - Explicit start/stop with join handles
//! - Cancellation tokens for every spawned task
//! - Timeouts around shutdown

pub mod dispatcher;
pub mod error;
pub mod wake_timer;

pub use dispatcher::{FireDispatcher, FireDispatcherConfig};
pub use error::{DispatcherError, DispatcherResult};
pub use wake_timer::TokioWakeTimer;

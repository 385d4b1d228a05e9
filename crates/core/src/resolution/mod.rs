//! Dose resolution
//!
//! Every fired alarm becomes a [`FiringInstance`]. Exactly one of confirm,
//! snooze, dismiss or the missed timeout wins it, and that winner writes the
//! single dose history row of the firing.

pub mod firing;
pub mod ports;
pub mod service;

pub use firing::FiringInstance;
pub use service::{DoseResolver, Resolution};

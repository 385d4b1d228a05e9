//! Alarm scheduling
//!
//! Computes fire times for daily alarms and snoozes and turns them into wake
//! requests on the [`ports::WakeTimer`].

pub mod occurrence;
pub mod ports;
pub mod service;

pub use occurrence::next_occurrence;
pub use service::{AlarmScheduler, ScheduleOutcome, SnoozeRequest};

//! # MedAlarm Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (storage, wake timer, presenter, clock)
//! - The alarm scheduler and the per-firing dose resolver
//! - Startup reconciliation
//! - Alarm management and history use cases
//!
//! ## Architecture Principles
//! - Only depends on `medalarm-domain`
//! - No database, timer or UI code
//! - All external dependencies via traits
//! - Failures of collaborators are logged, never propagated out of the
//!   lifecycle handlers

pub mod clock;
pub mod history;
pub mod management;
pub mod reconciliation;
pub mod resolution;
pub mod scheduling;
pub mod storage_ports;

pub use clock::{Clock, MockClock, SystemClock};
pub use history::HistoryService;
pub use management::AlarmService;
pub use reconciliation::{ReconciliationReport, ReconciliationRunner};
pub use resolution::ports::AlarmPresenter;
pub use resolution::{DoseResolver, FiringInstance, Resolution};
pub use scheduling::ports::WakeTimer;
pub use scheduling::{AlarmScheduler, ScheduleOutcome, SnoozeRequest};
pub use storage_ports::{DoseRecordStore, MedicationStore, ScheduleStore};

//! Shared test helpers for `medalarm-core` integration tests.
//!
//! In-memory stores and recording doubles so lifecycle tests can assert on
//! behaviour instead of wiring.

#![allow(dead_code)]

pub mod doubles;
pub mod stores;

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use medalarm_core::{
    AlarmScheduler, AlarmService, DoseResolver, HistoryService, MockClock, ReconciliationRunner,
};
use medalarm_domain::ReminderPolicy;

pub use doubles::{EventLog, RecordingPresenter, RecordingWakeTimer};
pub use stores::InMemoryDb;

/// Local wall-clock time on a fixed mid-June day, far from DST changes.
pub fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 10, hour, minute, 0).single().expect("unambiguous local time")
}

/// Same as [`at`] on the following day.
pub fn tomorrow_at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 11, hour, minute, 0).single().expect("unambiguous local time")
}

/// Fully wired core with in-memory collaborators.
pub struct Harness {
    pub log: EventLog,
    pub db: Arc<InMemoryDb>,
    pub timer: Arc<RecordingWakeTimer>,
    pub presenter: Arc<RecordingPresenter>,
    pub clock: MockClock,
    pub scheduler: Arc<AlarmScheduler>,
    pub resolver: Arc<DoseResolver>,
    pub runner: ReconciliationRunner,
    pub alarms: AlarmService,
    pub history: HistoryService,
}

impl Harness {
    pub fn new(now: DateTime<Local>) -> Self {
        Self::with_policy(now, ReminderPolicy::default())
    }

    pub fn with_policy(now: DateTime<Local>, policy: ReminderPolicy) -> Self {
        let log = EventLog::default();
        let db = Arc::new(InMemoryDb::new(log.clone()));
        let timer = Arc::new(RecordingWakeTimer::default());
        let presenter = Arc::new(RecordingPresenter::new(log.clone()));
        let clock = MockClock::new(now);

        let scheduler = Arc::new(AlarmScheduler::new(timer.clone(), Arc::new(clock.clone())));
        let resolver = Arc::new(DoseResolver::new(
            db.clone(),
            db.clone(),
            db.clone(),
            scheduler.clone(),
            presenter.clone(),
            Arc::new(clock.clone()),
            policy,
        ));
        let runner = ReconciliationRunner::new(
            db.clone(),
            db.clone(),
            db.clone(),
            scheduler.clone(),
            Arc::new(clock.clone()),
        );
        let alarms = AlarmService::new(db.clone(), db.clone(), scheduler.clone());
        let history = HistoryService::new(db.clone(), Arc::new(clock.clone()));

        Self { log, db, timer, presenter, clock, scheduler, resolver, runner, alarms, history }
    }
}
